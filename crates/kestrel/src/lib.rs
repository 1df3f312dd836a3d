//! # Kestrel
//!
//! A configurable Twitch chat bot.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   lines   ┌──────────────┐  per-message task  ┌──────────────┐
//! │  Connection  │──────────▶│   Session    │───────────────────▶│ Handler tree │
//! │ (transport)  │◀──────────│  (runtime)   │◀── response queue ─│ (framework)  │
//! └──────────────┘  frames   └──────────────┘                    └──────────────┘
//! ```
//!
//! - **core**: message parsing and the rate, cooldown and cache primitives
//! - **transport**: the connection with keepalive and framing
//! - **framework**: handlers, routing and middlewares
//! - **actions**: the built-in chat features
//! - **runtime**: configuration, logging and the session runner
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use kestrel::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config_from_file("config.yml")?;
//!     let creds = Credentials::load("creds.yml")?;
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
//!
//! ## Features
//!
//! - `ws-client` (default): WebSocket transport and the `kestrel` binary
//! - `json-log`: JSON log format

pub use kestrel_actions as actions;
pub use kestrel_core as core;
pub use kestrel_framework as framework;
pub use kestrel_runtime as runtime;
pub use kestrel_transport as transport;

/// Commonly used types for running or extending the bot.
///
/// ```rust,ignore
/// use kestrel::prelude::*;
/// ```
pub mod prelude {
    // Runtime
    pub use kestrel_runtime::{
        AppConfig, ConfigLoader, Credentials, Registry, Session, build_handler,
        cancel_on_shutdown, load_config, load_config_from_file,
    };

    // Handlers and routing
    pub use kestrel_framework::{
        BoxedHandler, ChatContext, Handler, KeyMatcher, Middleware, Mux, Router, handler_fn,
        middleware_fn, wrap,
    };

    // Messages
    pub use kestrel_core::{Message, kind, tag};

    // Transport
    pub use kestrel_transport::Dialer;
    #[cfg(feature = "ws-client")]
    pub use kestrel_transport::WsDialer;

    // Logging
    pub use kestrel_runtime::prelude::*;
}
