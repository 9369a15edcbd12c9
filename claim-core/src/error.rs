use thiserror::Error;

/// Errors produced by the claims core
#[derive(Error, Debug)]
pub enum ClaimError {
    /// The external detector could not process the input. Hard failure,
    /// surfaced to the caller with its correlation id.
    #[error("Detection failed: {0}")]
    DetectionFailed(String),

    /// The external assistant call errored or timed out. Never surfaced
    /// to callers of the gateway; absorbed as a breaker failure.
    #[error("Assistant invocation failed: {0}")]
    AssistantInvocationFailed(String),

    /// Missing or invalid configuration (e.g. assistant credentials).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Result type alias for claims core operations
pub type Result<T> = std::result::Result<T, ClaimError>;
