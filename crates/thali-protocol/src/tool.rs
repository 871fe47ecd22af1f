/// Errors returned by capabilities and the registry.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Capability name was not found in the registry.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),
    /// Argument bundle did not match the declared schema.
    #[error("schema violation: {0}")]
    SchemaViolation(String),
    /// Capability execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    /// Backing store could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// Generation call exhausted its retry budget.
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),
}
