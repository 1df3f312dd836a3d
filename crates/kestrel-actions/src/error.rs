//! Error types for actions.
//!
//! These never leave an action: they are logged and, where the action
//! defines one, turned into a single apology reply.

use thiserror::Error;

/// Errors that can occur while an action talks to an external service.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    /// The request could not be sent or the response not read.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The service answered with an error status.
    #[error("API call ended with status {status}: '{message}'")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message reported by the service, if any.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The configured region is not served by the ranking API.
    #[error("unknown region '{0}'")]
    UnknownRegion(String),
}

impl From<reqwest::Error> for ActionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

/// Result type for action operations.
pub type ActionResult<T> = Result<T, ActionError>;
