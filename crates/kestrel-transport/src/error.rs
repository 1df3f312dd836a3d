//! Transport error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while dialing or using a connection.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The dial attempt failed.
    #[error("dial failed: {url} - {reason}")]
    DialFailed {
        /// The endpoint that failed to connect.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The dial attempt did not finish in time.
    #[error("dial timed out after {0:?}")]
    DialTimeout(Duration),

    /// The peer closed the connection or the stream ended.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// Reading a frame failed.
    #[error("failed to read frame: {0}")]
    ReadFailed(String),

    /// Writing a frame failed.
    #[error("failed to send frame: {0}")]
    SendFailed(String),
}

impl TransportError {
    pub fn closed(reason: impl Into<String>) -> Self {
        Self::ConnectionClosed {
            reason: reason.into(),
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
