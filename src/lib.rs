//! Cabinet Contract Backend
//!
//! A Rust backend for law and notary cabinets with:
//! - Role-based permission model for cabinet members
//! - Multi-step AI contract pipeline (clarify → schema → audit → generate → complete)
//! - Hard-rule validation of collected form data
//! - HTTP surface mirroring the hosted edge-function wire contract

pub mod config;
pub mod error;
pub mod permissions;
pub mod pipeline;
pub mod provider;
pub mod safety;
pub mod server;
pub mod utils;

// Re-exports for convenience
pub use error::PipelineError;
pub use permissions::CabinetRole;
pub use pipeline::{ContractPipeline, GenerationSession};
pub use provider::LlmProvider;
