//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
///
/// All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found at the specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The sources could not be merged or extracted into the schema. This
    /// covers unknown action and middleware types as well as missing or
    /// ill-typed settings.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {message}")]
    ValidationError { message: String },

    /// A credential needed by the configuration is absent.
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    /// Settings that parsed but cannot be turned into a handler.
    #[error("Invalid settings for {context}: {reason}")]
    InvalidSettings { context: String, reason: String },
}

impl ConfigError {
    /// Creates a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// Creates an invalid settings error.
    pub fn invalid_settings(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidSettings {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
