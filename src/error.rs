//! Error types shared across the planner.

use thiserror::Error;

/// Result alias for `trip-planner`.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied something the planner cannot work with. Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The remote routing backend failed or answered with something unusable.
    #[error("upstream routing error: {0}")]
    UpstreamRouting(#[from] UpstreamError),

    #[error("planning cancelled")]
    Cancelled,
}

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }
}

/// Failures talking to the distance matrix backend.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {0}")]
    Status(u16),

    #[error("backend rejected query: {code}")]
    Rejected { code: String },

    #[error("response missing {0} table")]
    MissingTable(&'static str),

    #[error("matrix shape mismatch: expected {expected}x{expected}, found {found} rows")]
    ShapeMismatch { expected: usize, found: usize },

    /// Used by non-HTTP backends (and test doubles) to report unavailability.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
