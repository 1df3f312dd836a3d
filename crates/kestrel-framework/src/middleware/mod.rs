//! Middleware composition.
//!
//! A middleware is a [`tower_layer::Layer`] that turns one [`BoxedHandler`]
//! into another, running logic around the inner handler or skipping it.
//!
//! For `[A, B]` wrapping `H`, [`wrap`] yields `A(B(H))`: the first
//! middleware is outermost, so "before" logic runs `A, B, H`.
//!
//! # Built-in middlewares
//!
//! | Middleware | Behavior |
//! |------------|----------|
//! | [`Filter`] | Runs a penalty instead of the next handler when a check fails |
//! | [`Autorespond`] | Sends a canned text at most once per period |
//! | [`DebugLogger`] | Logs every raw line |

use std::sync::Arc;

use tower_layer::{Layer, layer_fn};

use crate::handler::BoxedHandler;

pub mod autorespond;
pub mod debug;
pub mod filter;

pub use autorespond::{Autorespond, AutorespondSettings, SpamSettings};
pub use debug::DebugLogger;
pub use filter::{CharClass, Filter, FilterKind, FilterSettings, Penalty, PenaltyKind};

/// A type-erased middleware.
pub type Middleware = Arc<dyn Layer<BoxedHandler, Service = BoxedHandler> + Send + Sync>;

/// Converts a closure into a [`Middleware`].
pub fn middleware_fn<F>(f: F) -> Middleware
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    Arc::new(layer_fn(f))
}

/// Wraps `handler` so that `middlewares[0]` is outermost.
pub fn wrap(handler: BoxedHandler, middlewares: &[Middleware]) -> BoxedHandler {
    middlewares
        .iter()
        .rev()
        .fold(handler, |inner, middleware| middleware.layer(inner))
}

/// Combines several middlewares into one, preserving their order.
pub fn concat(middlewares: Vec<Middleware>) -> Middleware {
    middleware_fn(move |handler| wrap(handler, &middlewares))
}
