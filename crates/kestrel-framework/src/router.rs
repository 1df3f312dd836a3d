//! Mux and Router.
//!
//! A [`Mux`] maps keys extracted by a [`KeyMatcher`] to handlers. A
//! [`Router`] tries several muxes in order and runs the first handler found;
//! a mux whose key is missing or unregistered falls through to the next one.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut rewards = Mux::new(KeyMatcher::Reward);
//! rewards.add("0b1c...", song_request, &[]);
//!
//! let mut commands = Mux::new(KeyMatcher::command());
//! commands.add("hello", hello, &[cooldown]);
//!
//! let chat = Router::new(vec![rewards, commands]);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use kestrel_core::Message;

use crate::context::ChatContext;
use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::matcher::KeyMatcher;
use crate::middleware::{Middleware, wrap};

// =============================================================================
// Mux
// =============================================================================

/// A keyed handler table.
pub struct Mux {
    matcher: KeyMatcher,
    middlewares: Vec<Middleware>,
    handlers: HashMap<String, BoxedHandler>,
}

impl Mux {
    pub fn new(matcher: KeyMatcher) -> Self {
        Self::with_middlewares(matcher, Vec::new())
    }

    /// Creates a mux whose middlewares wrap every handler added later.
    pub fn with_middlewares(matcher: KeyMatcher, middlewares: Vec<Middleware>) -> Self {
        Self {
            matcher,
            middlewares,
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` under `key`.
    ///
    /// The mux middlewares run first, then `middlewares`, then the handler.
    /// Registering a key again replaces the previous handler.
    pub fn add(
        &mut self,
        key: impl Into<String>,
        handler: BoxedHandler,
        middlewares: &[Middleware],
    ) -> &mut Self {
        let chain: Vec<Middleware> = self
            .middlewares
            .iter()
            .chain(middlewares)
            .cloned()
            .collect();
        self.handlers.insert(key.into(), wrap(handler, &chain));
        self
    }

    /// Returns the handler registered for the key of `msg`.
    pub fn route(&self, msg: &Message) -> Option<&BoxedHandler> {
        let key = self.matcher.key(msg)?;
        self.handlers.get(key)
    }

    pub fn matcher(&self) -> KeyMatcher {
        self.matcher
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn into_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl Handler for Mux {
    fn serve(&self, ctx: Arc<ChatContext>) -> BoxFuture<'static, ()> {
        match self.route(ctx.message()) {
            Some(handler) => handler.serve(ctx),
            None => {
                trace!(matcher = ?self.matcher, "No handler for message");
                Box::pin(async {})
            }
        }
    }
}

impl std::fmt::Debug for Mux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.handlers.keys().collect();
        keys.sort();
        f.debug_struct("Mux")
            .field("matcher", &self.matcher)
            .field("keys", &keys)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Router
// =============================================================================

/// Tries muxes in priority order; the first one with a registered handler
/// for the message wins.
#[derive(Debug, Default)]
pub struct Router {
    muxes: Vec<Mux>,
}

impl Router {
    pub fn new(muxes: Vec<Mux>) -> Self {
        Self { muxes }
    }

    /// Appends a mux with the lowest priority so far.
    pub fn push(&mut self, mux: Mux) -> &mut Self {
        self.muxes.push(mux);
        self
    }

    pub fn route(&self, msg: &Message) -> Option<&BoxedHandler> {
        self.muxes.iter().find_map(|mux| mux.route(msg))
    }

    pub fn into_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl Handler for Router {
    fn serve(&self, ctx: Arc<ChatContext>) -> BoxFuture<'static, ()> {
        match self.route(ctx.message()) {
            Some(handler) => handler.serve(ctx),
            None => Box::pin(async {}),
        }
    }
}
