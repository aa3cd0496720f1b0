//! Runtime configuration.
//!
//! Everything is read once from the environment at startup; `.env` files
//! are honored via `dotenv` in `main`.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Configuration for the backend.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Base URL of the OpenAI-compatible chat-completions endpoint.
    pub provider_base_url: String,
    /// Bearer token for the provider; optional for local gateways.
    pub provider_api_key: Option<String>,
    /// Model identifier sent with every chat call.
    pub model: String,
    /// Per-request timeout for provider calls.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8002".to_string(),
            provider_base_url: "https://api.openai.com/v1".to_string(),
            provider_api_key: None,
            model: "gpt-4o".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Build the configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let request_timeout = match env::var("LEXCABINET_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .context("LEXCABINET_TIMEOUT_SECS must be an integer number of seconds")?,
            ),
            Err(_) => defaults.request_timeout,
        };

        Ok(Self {
            bind_addr: env::var("LEXCABINET_BIND").unwrap_or(defaults.bind_addr),
            provider_base_url: env::var("LEXCABINET_BASE_URL").unwrap_or(defaults.provider_base_url),
            provider_api_key: env::var("OPENAI_API_KEY").ok(),
            model: env::var("LEXCABINET_MODEL").unwrap_or(defaults.model),
            request_timeout,
        })
    }
}
