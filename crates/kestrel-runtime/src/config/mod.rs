//! Configuration for the kestrel runtime.
//!
//! The bot is described by one YAML file: logging, session tuning, and per
//! channel the triggers and middlewares that make up its handler tree.
//! Credentials live in a separate file, see [`crate::credentials`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    ActionConfig, AppConfig, ChannelConfig, ChatConfig, LogFormat, LogLevel, LogOutput,
    LoggingConfig, MiddlewareConfig, SessionConfig, TriggerConfig,
};
pub use validation::validate_config;
