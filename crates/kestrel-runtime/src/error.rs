//! Runtime error types.

use thiserror::Error;

use kestrel_transport::TransportError;

use crate::config::ConfigError;

/// Errors that end a run.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Bad configuration or credentials, found at startup.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Every dial attempt of one reconnect cycle failed.
    #[error("Dial failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: TransportError,
    },

    /// A session step failed. Recovered by redialing; only surfaces from
    /// [`Session::serve_once`](crate::session::Session::serve_once).
    #[error("Session error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
