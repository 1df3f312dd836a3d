//! Handler system for kestrel.
//!
//! A [`Handler`] processes one message and emits responses through the
//! [`ChatContext`]. Handlers never return a value; everything observable
//! happens on the response queue.
//!
//! # Example
//!
//! ```rust,ignore
//! use kestrel_framework::handler_fn;
//!
//! let hello = handler_fn(|ctx| async move {
//!     let _ = ctx.reply("hello!").await;
//! });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::ChatContext;

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core handler capability.
pub trait Handler: Send + Sync + 'static {
    /// Processes one message.
    fn serve(&self, ctx: Arc<ChatContext>) -> BoxFuture<'static, ()>;
}

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler = Arc<dyn Handler>;

/// Adapts an async closure into a [`Handler`].
pub struct HandlerFn<F> {
    f: F,
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Arc<ChatContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn serve(&self, ctx: Arc<ChatContext>) -> BoxFuture<'static, ()> {
        Box::pin((self.f)(ctx))
    }
}

/// Converts an async closure into a boxed handler.
pub fn handler_fn<F, Fut>(f: F) -> BoxedHandler
where
    F: Fn(Arc<ChatContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(HandlerFn { f })
}
