use thiserror::Error;

/// Errors surfaced by the studio.
///
/// None of these are fatal to the process: validation errors are reported
/// before any remote call, remote errors are recovered per image by the
/// orchestrator, and history errors leave the in-memory history untouched.
#[derive(Error, Debug)]
pub enum StudioError {
    /// Input rejected before any side effect (empty prompt, unknown model, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// No signed-in user for an operation that requires one
    #[error("Not signed in")]
    Unauthorized,

    /// Sign-in or sign-up rejected by the identity provider
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A batch is already running for this session
    #[error("A generation is already in progress")]
    Busy,

    /// History record lookup failed
    #[error("History record not found: {0}")]
    NotFound(String),

    /// Remote generation service returned an error or an unusable payload
    #[error("Remote generation error: {0}")]
    Remote(String),

    /// Persisted history could not be read or written
    #[error("History storage error: {0}")]
    Storage(String),

    /// Missing or malformed runtime configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Background batch task panicked or was aborted
    #[error("Internal error: {0}")]
    Internal(String),

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;

impl StudioError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }
}

impl From<anyhow::Error> for StudioError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
