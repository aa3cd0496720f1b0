//! Contract Generation Pipeline
//!
//! Turns a free-text contract request into a validated, client-complete
//! contract document via chained remote steps:
//! clarify → schema → audit → validate → generate → complete.
//!
//! The remote endpoints hold no session state; [`GenerationSession`] is the
//! caller-owned, serializable state machine driving the flow.

pub mod prompts;
pub mod questions;
pub mod session;
pub mod steps;
pub mod types;
pub mod validate;

pub use session::{GenerationSession, SessionStep, MAX_AUDIT_ITERATIONS, MAX_CLARIFY_ROUNDS};
pub use steps::ContractPipeline;
pub use validate::{validate_form_data, ValidationResult};
