//! Error types for clipfetch
//!
//! The taxonomy mirrors the task lifecycle: submission failures return the
//! caller to `Idle`, terminal task failures are surfaced once with the
//! server's message, transient poll failures are recovered locally and never
//! surfaced, and gate failures are recovered through the fallback delivery
//! path rather than reported as errors.

use thiserror::Error;

/// Result type alias for clipfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for clipfetch
#[derive(Debug, Error)]
pub enum Error {
    /// Submission was rejected by the task service or failed before a task
    /// was created; the orchestrator is back in `Idle`
    #[error("submission failed: {message}")]
    Submission {
        /// Human-readable message, sourced from the response body when present
        message: String,
    },

    /// A task is already in flight; only one task may be active at a time
    #[error("a task is already in progress")]
    TaskInProgress,

    /// The task service reported a terminal failure for the active task
    #[error("task failed: {message}")]
    TaskFailed {
        /// Error message provided by the service
        message: String,
    },

    /// Requested format is not among the advertised formats
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Source metadata could not be retrieved
    #[error("video info unavailable: {message}")]
    VideoInfo {
        /// Human-readable message from the service
        message: String,
    },

    /// Network or transport error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered but the body did not match the wire contract
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid base or endpoint URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors reported by a completion gate collaborator
///
/// Never surfaced through [`Error`]; the orchestrator recovers by delivering
/// after the configured fallback delay.
#[derive(Debug, Error)]
pub enum GateError {
    /// The gate could not be presented
    #[error("gate unavailable: {0}")]
    Unavailable(String),
}
