//! Raw-line logging middleware.

use std::sync::Arc;

use tower_layer::Layer;
use tracing::info;

use crate::context::ChatContext;
use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::middleware::Middleware;

/// Logs the raw line of every message before passing it on.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugLogger;

impl DebugLogger {
    pub fn into_middleware(self) -> Middleware {
        Arc::new(self)
    }
}

impl Layer<BoxedHandler> for DebugLogger {
    type Service = BoxedHandler;

    fn layer(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(Logged { next })
    }
}

struct Logged {
    next: BoxedHandler,
}

impl Handler for Logged {
    fn serve(&self, ctx: Arc<ChatContext>) -> BoxFuture<'static, ()> {
        info!(raw = %ctx.message().raw, "Received");
        self.next.serve(ctx)
    }
}
