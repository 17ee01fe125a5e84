//! Error types for snowball-agent

use thiserror::Error;

use crate::operation::OperationSpec;

/// Result type alias using snowball-agent Error
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown when a structured payload cannot be used
pub const PAYLOAD_ERROR_MESSAGE: &str = "Error parsing response data. Please try again.";

/// Message shown when the user cancels a call
pub const CANCELLED_MESSAGE: &str = "Request cancelled.";

/// Errors that can occur while running a shopping turn
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the wire layer
    #[error(transparent)]
    Ai(#[from] snowball_ai::Error),

    /// The structured payload was missing, unparseable or off-schema
    #[error("Invalid response payload: {0}")]
    Payload(String),

    /// A call is already running for this session
    #[error("A request is already in progress")]
    Busy,

    /// A generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Human-readable text for the chat, given the operation that failed.
    pub fn user_message(&self, spec: &OperationSpec) -> String {
        match self {
            Error::Ai(snowball_ai::Error::Aborted) => CANCELLED_MESSAGE.to_string(),
            Error::Payload(_) => PAYLOAD_ERROR_MESSAGE.to_string(),
            Error::Busy => self.to_string(),
            Error::Ai(_) | Error::Other(_) => spec.failure_message.clone(),
        }
    }

    /// Check if the call was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Ai(snowball_ai::Error::Aborted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationSpec;

    #[test]
    fn test_user_message_per_operation() {
        let search = OperationSpec::search();
        let payment = OperationSpec::payment();

        assert_eq!(
            Error::Ai(snowball_ai::Error::MissingBody).user_message(&search),
            "Failed to search products. Please try again."
        );
        assert_eq!(
            Error::Ai(snowball_ai::Error::UnexpectedEnd).user_message(&payment),
            "Failed to confirm payment. Please try again."
        );
    }

    #[test]
    fn test_payload_and_cancel_messages() {
        let scene = OperationSpec::scene();
        assert_eq!(
            Error::Payload("bad".into()).user_message(&scene),
            PAYLOAD_ERROR_MESSAGE
        );
        let cancelled = Error::Ai(snowball_ai::Error::Aborted);
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.user_message(&scene), CANCELLED_MESSAGE);
    }
}
