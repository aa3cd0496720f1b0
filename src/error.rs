//! Error taxonomy for the contract pipeline.

use thiserror::Error;

/// Errors surfaced by pipeline steps and the session state machine.
///
/// Permission denials are never errors; they are booleans plus a denial
/// message (see [`crate::permissions`]).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A request is missing required fields or a step was invoked out of
    /// order. Maps to HTTP 400 on the wire.
    #[error("{0}")]
    Validation(String),

    /// The LLM provider answered with a non-success status; the provider's
    /// own message is embedded. Maps to HTTP 500.
    #[error("{0}")]
    Upstream(String),

    /// The provider's text response did not parse as the documented JSON
    /// shape after code-fence stripping. Maps to HTTP 500.
    #[error("Format de réponse invalide de l'IA")]
    InvalidFormat,

    /// A bounded loop (clarification rounds) hit its cap.
    #[error("Nombre maximum de tentatives atteint ({0})")]
    RetriesExhausted(usize),

    /// Transport-level failure talking to the provider. Maps to HTTP 500.
    #[error("Erreur réseau vers le fournisseur IA: {0}")]
    Transport(#[from] reqwest::Error),
}
