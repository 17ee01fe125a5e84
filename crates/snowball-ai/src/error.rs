//! Error types for snowball-ai

use std::time::Duration;

use thiserror::Error;

/// Result type alias using snowball-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the gateway
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Gateway answered with a non-2xx status
    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },

    /// Gateway answered without a body to stream
    #[error("No response body")]
    MissingBody,

    /// No chunk arrived within the idle window
    #[error("Stream stalled: no data for {0:?}")]
    IdleTimeout(Duration),

    /// Body ended before the terminal event
    #[error("Stream ended before response.completed")]
    UnexpectedEnd,

    /// Call was cancelled by the caller
    #[error("Request aborted")]
    Aborted,
}

impl Error {
    /// Check if this error is a call-level transport failure
    /// (network, status, missing body, stall or truncated stream).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::Status { .. }
                | Error::MissingBody
                | Error::IdleTimeout(_)
                | Error::UnexpectedEnd
        )
    }

    /// HTTP status code, if the gateway returned one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
