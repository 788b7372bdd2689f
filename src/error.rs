//! Error types for the score update handler.

use axum::http::StatusCode;

/// Everything that can go wrong while recording a score.
///
/// Only `MethodNotAllowed` has its own status code. Every other variant is
/// reported to the caller as a 500 carrying the display message.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// Request used a method other than POST.
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Request body is not a valid score submission.
    #[error("invalid score submission: {message}")]
    MalformedInput { message: String },

    /// Reading the leaderboard file failed.
    #[error("failed to read leaderboard: {message}")]
    UpstreamRead { message: String },

    /// The stored file exists but is not a leaderboard.
    #[error("stored leaderboard is malformed: {message}")]
    MalformedStoredData { message: String },

    /// Writing the leaderboard file was rejected.
    #[error("GitHub update failed: {reason}")]
    UpstreamWrite { status: u16, reason: String },

    /// The revision marker sent with the write was stale.
    #[error("GitHub update failed: Conflict")]
    WriteConflict,

    /// Transport-level failure talking to GitHub.
    #[error("network error: {message}")]
    Network { message: String },
}

impl UpdateError {
    /// Status code returned to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a fresh read-modify-write could succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::WriteConflict)
    }
}

impl From<reqwest::Error> for UpdateError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for leaderboard updates.
pub type UpdateResult<T> = Result<T, UpdateError>;

/// Startup configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}
