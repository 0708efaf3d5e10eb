//! Error taxonomy for backend calls

use thiserror::Error;

/// Failure of a single backend request or of its client-side preconditions.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Token absent, expired or rejected. The session has already been cleared.
    #[error("session expired or unauthorized -- run 'wacon login'")]
    Unauthorized,

    /// No token stored locally; no request was sent.
    #[error("not signed in -- run 'wacon login'")]
    NotSignedIn,

    /// A required field was missing; no request was sent.
    #[error("{0}")]
    Validation(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Http { status: 404, .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::NotSignedIn)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
