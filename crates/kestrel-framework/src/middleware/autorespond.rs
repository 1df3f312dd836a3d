//! Canned-text middlewares.
//!
//! Both send a fixed text when their [`Cooldown`] opens and always continue
//! to the next handler. `autorespond` wraps a trigger or a channel and may
//! require a number of quiet messages between responses; `spam` wraps a
//! whole channel with a plain period.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tower_layer::Layer;
use tracing::warn;

use kestrel_core::duration::humantime_serde;
use kestrel_core::{Clock, Cooldown, SystemClock};

use crate::context::ChatContext;
use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::middleware::Middleware;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutorespondSettings {
    pub text: String,
    #[serde(with = "humantime_serde")]
    pub period: Duration,
    /// Messages that must pass between two responses.
    #[serde(default)]
    pub gap: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpamSettings {
    pub text: String,
    #[serde(with = "humantime_serde")]
    pub period: Duration,
}

struct State<C: Clock> {
    text: String,
    cooldown: Cooldown<C>,
}

/// Sends a text whenever the cooldown allows, then runs the next handler.
pub struct Autorespond<C: Clock = SystemClock> {
    state: Arc<State<C>>,
}

impl<C: Clock> Clone for Autorespond<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl Autorespond {
    pub fn new(settings: &AutorespondSettings) -> Self {
        Self::with_clock(settings, SystemClock)
    }

    /// The channel-wide variant with no gap.
    pub fn spam(settings: &SpamSettings) -> Self {
        Self::new(&AutorespondSettings {
            text: settings.text.clone(),
            period: settings.period,
            gap: 0,
        })
    }
}

impl<C: Clock> Autorespond<C> {
    pub fn with_clock(settings: &AutorespondSettings, clock: C) -> Self {
        Self {
            state: Arc::new(State {
                text: settings.text.clone(),
                cooldown: Cooldown::with_clock(settings.period, settings.gap, clock),
            }),
        }
    }

    pub fn into_middleware(self) -> Middleware {
        Arc::new(self)
    }
}

impl<C: Clock> Layer<BoxedHandler> for Autorespond<C> {
    type Service = BoxedHandler;

    fn layer(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(AutorespondHandler {
            state: Arc::clone(&self.state),
            next,
        })
    }
}

struct AutorespondHandler<C: Clock> {
    state: Arc<State<C>>,
    next: BoxedHandler,
}

impl<C: Clock> Handler for AutorespondHandler<C> {
    fn serve(&self, ctx: Arc<ChatContext>) -> BoxFuture<'static, ()> {
        let state = Arc::clone(&self.state);
        let next = Arc::clone(&self.next);

        Box::pin(async move {
            if state.cooldown.check()
                && let Err(e) = ctx.send(state.text.as_str()).await
            {
                warn!(error = %e, "Failed to send autoresponse");
            }
            next.serve(ctx).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::testing::{Trace, context, drain};
    use crate::middleware::wrap;
    use kestrel_core::ManualClock;

    const LINE: &str = ":viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #chan :hi";

    #[tokio::test]
    async fn test_responds_once_per_period_after_gap() {
        let clock = ManualClock::new();
        let trace = Trace::default();
        let settings = AutorespondSettings {
            text: "follow the stream!".into(),
            period: Duration::from_secs(600),
            gap: 2,
        };
        let handler = wrap(
            trace.handler("next"),
            &[Autorespond::with_clock(&settings, clock.clone()).into_middleware()],
        );

        clock.advance(Duration::from_secs(600));

        let mut texts = Vec::new();
        for _ in 0..4 {
            let (ctx, mut rx) = context(LINE);
            handler.serve(ctx).await;
            texts.extend(drain(&mut rx).into_iter().map(|r| r.text));
        }

        // Two quiet messages, one response, then the period restarts.
        assert_eq!(texts, ["follow the stream!"]);
        assert_eq!(trace.entries().len(), 4);
    }

    #[test]
    fn test_settings_default_gap() {
        let settings: AutorespondSettings = serde_json::from_value(serde_json::json!({
            "text": "hi",
            "period": "10m",
        }))
        .unwrap();
        assert_eq!(settings.gap, 0);
        assert_eq!(settings.period, Duration::from_secs(600));
    }
}
