//! Error types for the kestrel framework.

use thiserror::Error;

/// Errors returned when a handler emits a response.
#[derive(Debug, Clone, Error)]
pub enum ResponseError {
    /// The session that owned the response queue has ended.
    #[error("response queue closed")]
    QueueClosed,

    /// The message lacks a field the response needs.
    #[error("message has no {0}")]
    MissingField(&'static str),
}

/// Result type for response operations.
pub type ResponseResult<T> = Result<T, ResponseError>;

/// Middleware or handler settings that cannot be turned into a working
/// instance.
#[derive(Debug, Clone, Error)]
#[error("invalid settings: {0}")]
pub struct InvalidSettings(pub String);

impl InvalidSettings {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
