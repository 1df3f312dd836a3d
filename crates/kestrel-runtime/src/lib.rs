//! Kestrel Runtime - everything between the configuration file and a live
//! chat session.
//!
//! This crate provides:
//! - The typed configuration schema and its `figment` loader (`config`)
//! - Credentials loading (`Credentials`)
//! - Logging setup (`LoggingBuilder`)
//! - Handler tree assembly from configuration (`Registry`)
//! - The session runner with reconnect backoff (`Session`)
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use kestrel_runtime::{Credentials, Session, build_handler, cancel_on_shutdown, load_config_from_file};
//! use kestrel_transport::WsDialer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config_from_file("config.yml")?;
//!     let creds = Credentials::load("creds.yml")?;
//!     kestrel_runtime::logging::init_from_config(&config.logging);
//!
//!     let handler = build_handler(&config, &creds)?;
//!     let dialer = Arc::new(WsDialer::new(&config.session.endpoint));
//!
//!     Session::new(dialer, handler, creds, &config)
//!         .run(cancel_on_shutdown())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod backoff;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod registry;
pub mod session;
pub mod shutdown;

// Re-exports
pub use backoff::{Retry, RetryPolicy, retry};
pub use config::{
    AppConfig, ConfigError, ConfigLoader, ConfigResult, load_config, load_config_from_file,
};
pub use credentials::Credentials;
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use registry::{Registry, build_handler};
pub use session::Session;
pub use shutdown::{cancel_on_shutdown, wait_for_shutdown};

pub use tracing;
pub use tracing_subscriber;

/// The `tracing` macros and `Level`, for crates that log through the
/// runtime's subscriber.
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
