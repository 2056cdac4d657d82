// src/infra/errors.rs — Error types for flowcast

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    // Malformed input (rejected at point of use, never fatal)
    #[error("Malformed signature '{signature}': {reason}")]
    MalformedSignature { signature: String, reason: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // Replay
    #[error("Action '{action_id}' of kind '{kind}' cannot be run by this runner")]
    UnsupportedAction { action_id: String, kind: String },

    #[error("Action '{action_id}' failed: {message}")]
    Runner { action_id: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Infra
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlowError {
    pub fn malformed(signature: &str, reason: impl Into<String>) -> Self {
        FlowError::MalformedSignature {
            signature: signature.to_string(),
            reason: reason.into(),
        }
    }

    /// Malformed-input errors are expected on noisy event streams and are
    /// logged at `warn`; everything else is an operational failure.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            FlowError::MalformedSignature { .. } | FlowError::InvalidUrl { .. }
        )
    }
}
