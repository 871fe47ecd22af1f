//! Error types for the core orchestrator crate.

use thiserror::Error;

/// Errors returned by orchestrator operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Preference store failure.
    #[error("store error: {0}")]
    Store(String),
    /// Conversation memory failure.
    #[error("memory error: {0}")]
    Memory(String),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
