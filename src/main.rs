//! Cabinet Contract Backend
//!
//! Serves the AI contract-generation pipeline for law and notary cabinets:
//! clarification, form-schema generation, quality audit, contract drafting
//! and client completion, behind the edge-function wire contract.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use lexcabinet::config::Config;
use lexcabinet::pipeline::ContractPipeline;
use lexcabinet::provider::OpenAiCompatibleProvider;
use lexcabinet::safety::RateLimiter;
use lexcabinet::server::{run_server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let config = Config::from_env()?;

    println!("\n{}", "═".repeat(60));
    println!("🏛️  Cabinet Contract Backend v0.2.0");
    println!("{}", "═".repeat(60));
    println!("Pipeline: Clarify | Schema | Audit | Generate | Complete");
    println!("Model: {} via {}", config.model, config.provider_base_url);
    println!("{}\n", "═".repeat(60));

    let provider = OpenAiCompatibleProvider::new(
        config.provider_base_url.clone(),
        config.provider_api_key.clone(),
        config.model.clone(),
        config.request_timeout,
    )?;

    let state = AppState {
        pipeline: Arc::new(ContractPipeline::new(Arc::new(provider))),
        limiter: Arc::new(Mutex::new(RateLimiter::new())),
    };

    run_server(state, &config.bind_addr).await
}
