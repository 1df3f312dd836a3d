//! # Kestrel Transport
//!
//! The line-oriented chat connection used by the kestrel session runner.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  Session runner      │  (dial, login, join, read loop)
//! ├──────────────────────┤
//! │  Connection          │  <- line splitting, keepalive, framing
//! ├──────────────────────┤
//! │  FrameSource / Sink  │  (WebSocket, in-memory)
//! └──────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `ws-client` (default): [`WsDialer`] over `tokio-tungstenite`

pub mod command;
pub mod connection;
pub mod error;
pub mod memory;

#[cfg(feature = "ws-client")]
pub mod websocket;

pub use connection::{
    BoxedSink, BoxedSource, Connection, Dialer, FrameSink, FrameSource, FrameWriter, dial,
};
pub use error::{TransportError, TransportResult};

#[cfg(feature = "ws-client")]
pub use websocket::WsDialer;
