//! Error types for preference storage.

/// Errors returned by preference stores.
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
