//! # Kestrel Framework
//!
//! Dispatch for parsed chat messages.
//!
//! This layer provides:
//! - The [`Handler`] capability and [`ChatContext`], the per-message response
//!   object handlers write to
//! - [`KeyMatcher`], [`Mux`] and [`Router`] for keyed, prioritized routing
//! - Middleware composition over `tower-layer` plus the built-in `filter`,
//!   `autorespond`, `spam` and `debug` middlewares
//!
//! ```text
//! Mux(channel) ─► Mux(type) ─► Router[ Mux(reward), Mux(command) ] ─► action
//!                      ▲               ▲                                  ▲
//!                 spam + chat     trigger middlewares wrap each action ───┘
//!                 middlewares
//! ```

pub mod context;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod middleware;
pub mod router;

pub use context::{ChatContext, DEFAULT_QUEUE_CAPACITY, Responder, Response, response_queue};
pub use error::{InvalidSettings, ResponseError, ResponseResult};
pub use handler::{BoxFuture, BoxedHandler, Handler, HandlerFn, handler_fn};
pub use matcher::{DEFAULT_COMMAND_PREFIX, KeyMatcher};
pub use middleware::{Middleware, concat, middleware_fn, wrap};
pub use router::{Mux, Router};
