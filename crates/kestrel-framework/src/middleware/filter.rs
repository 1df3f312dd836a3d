//! Filter middleware.
//!
//! A filter lets a message through to the next handler when the sender is
//! privileged or the configured check passes. Otherwise it runs a penalty
//! (delete, timeout, ban, optional reply) and, unless `passThrough` is set,
//! stops there.
//!
//! ```yaml
//! type: filter
//! settings:
//!   type: countLimit
//!   limitAmount: 5
//!   limitPeriod: 30s
//!   penalty: timeout
//!   duration: 10m
//!   reason: slow down
//!   allowMod: true
//! ```

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tower_layer::Layer;
use tracing::{debug, warn};

use kestrel_core::duration::humantime_serde;
use kestrel_core::{Message, RateCounter};

use crate::context::ChatContext;
use crate::error::InvalidSettings;
use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::middleware::Middleware;

const URL_PATTERN: &str = r"(http(s)?://.)?(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-z]{2,6}\b([-a-zA-Z0-9@:%_+.~#?&/=]*)";

// =============================================================================
// Settings
// =============================================================================

/// Character class counted by [`FilterKind::LimitChars`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CharClass {
    /// Unicode symbols (math, currency, modifier, other), including emoji.
    Symbol,
    /// Uppercase letters.
    Upper,
    /// Combining marks.
    Mark,
}

/// The check a filter applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterKind {
    /// Passes only messages from one user.
    #[serde(rename_all = "camelCase")]
    ByUsername { username: String },
    /// Passes at most `limit_amount` messages per `limit_period`, counted
    /// across everyone the filter sees.
    #[serde(rename_all = "camelCase")]
    CountLimit {
        limit_amount: u64,
        #[serde(with = "humantime_serde")]
        limit_period: Duration,
    },
    /// Passes messages with at most `char_limit` characters of a class.
    #[serde(rename_all = "camelCase")]
    LimitChars {
        char_type: CharClass,
        char_limit: usize,
    },
    /// Passes messages without anything that looks like a link.
    BlockLinks,
    /// Passes nothing.
    BlockAll,
}

/// What happens to a message that fails the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PenaltyKind {
    DeleteMsg,
    Timeout,
    Ban,
}

/// Typed settings of a filter middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSettings {
    #[serde(flatten)]
    pub kind: FilterKind,

    #[serde(default)]
    pub penalty: Option<PenaltyKind>,
    /// Timeout length; required when `penalty` is `timeout`.
    #[serde(default, with = "humantime_serde::option")]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub reason: String,
    /// Text replied to the offending message.
    #[serde(default)]
    pub reply: Option<String>,
    /// Keep running the next handler after the penalty.
    #[serde(default)]
    pub pass_through: bool,

    #[serde(default)]
    pub allow_mod: bool,
    #[serde(default, rename = "allowVIP")]
    pub allow_vip: bool,
    #[serde(default)]
    pub allow_sub: bool,
    #[serde(default)]
    pub allow_rewards: Vec<String>,
}

impl FilterSettings {
    pub fn new(kind: FilterKind) -> Self {
        Self {
            kind,
            penalty: None,
            duration: None,
            reason: String::new(),
            reply: None,
            pass_through: false,
            allow_mod: false,
            allow_vip: false,
            allow_sub: false,
            allow_rewards: Vec::new(),
        }
    }
}

// =============================================================================
// Compiled filter
// =============================================================================

enum Check {
    Username(String),
    Count(RateCounter),
    Upper(usize),
    Class(Regex, usize),
    Links(Regex),
    All,
}

impl Check {
    fn build(kind: &FilterKind) -> Result<Self, InvalidSettings> {
        let check = match kind {
            FilterKind::ByUsername { username } => Self::Username(username.clone()),
            FilterKind::CountLimit {
                limit_amount,
                limit_period,
            } => Self::Count(RateCounter::new(*limit_amount, *limit_period)),
            FilterKind::LimitChars {
                char_type: CharClass::Upper,
                char_limit,
            } => Self::Upper(*char_limit),
            FilterKind::LimitChars {
                char_type,
                char_limit,
            } => {
                let pattern = match char_type {
                    CharClass::Mark => r"\p{M}",
                    _ => r"\p{S}",
                };
                Self::Class(compile(pattern)?, *char_limit)
            }
            FilterKind::BlockLinks => Self::Links(compile(URL_PATTERN)?),
            FilterKind::BlockAll => Self::All,
        };
        Ok(check)
    }

    fn passes(&self, msg: &Message) -> bool {
        match self {
            Self::Username(name) => msg.user() == Some(name.as_str()),
            Self::Count(counter) => counter.add(1),
            Self::Upper(limit) => msg.text.chars().filter(|c| c.is_uppercase()).count() <= *limit,
            Self::Class(class, limit) => class.find_iter(&msg.text).count() <= *limit,
            Self::Links(urls) => !urls.is_match(&msg.text),
            Self::All => false,
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, InvalidSettings> {
    Regex::new(pattern).map_err(|e| InvalidSettings::new(format!("bad pattern: {e}")))
}

/// A resolved penalty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Penalty {
    None,
    DeleteMessage,
    Timeout(Duration),
    Ban,
}

impl Penalty {
    fn from_settings(settings: &FilterSettings) -> Result<Self, InvalidSettings> {
        Ok(match settings.penalty {
            None => Self::None,
            Some(PenaltyKind::DeleteMsg) => Self::DeleteMessage,
            Some(PenaltyKind::Ban) => Self::Ban,
            Some(PenaltyKind::Timeout) => Self::Timeout(settings.duration.ok_or_else(|| {
                InvalidSettings::new("timeout penalty requires a duration")
            })?),
        })
    }
}

struct FilterState {
    check: Check,
    penalty: Penalty,
    reason: String,
    reply: Option<String>,
    pass_through: bool,
    allow_mod: bool,
    allow_vip: bool,
    allow_sub: bool,
    allow_rewards: Vec<String>,
}

impl FilterState {
    fn allows(&self, msg: &Message) -> bool {
        msg.is_broadcaster()
            || self.allow_mod && msg.is_moderator()
            || self.allow_vip && msg.is_vip()
            || self.allow_sub && msg.is_subscriber()
            || msg
                .reward_id()
                .is_some_and(|id| self.allow_rewards.iter().any(|allowed| allowed == id))
            || self.check.passes(msg)
    }

    async fn punish(&self, ctx: &ChatContext) {
        let result = match &self.penalty {
            Penalty::None => Ok(()),
            Penalty::DeleteMessage => ctx.delete().await,
            Penalty::Timeout(duration) => ctx.timeout(*duration, &self.reason).await,
            Penalty::Ban => ctx.ban(&self.reason).await,
        };
        if let Err(e) = result {
            warn!(error = %e, penalty = ?self.penalty, "Failed to apply penalty");
        }

        if let Some(text) = &self.reply
            && let Err(e) = ctx.reply(text.as_str()).await
        {
            warn!(error = %e, "Failed to send filter reply");
        }
    }
}

/// The filter middleware.
///
/// Clones share state, so a count limit applies across every handler the
/// filter wraps.
#[derive(Clone)]
pub struct Filter {
    state: Arc<FilterState>,
}

impl Filter {
    pub fn new(settings: &FilterSettings) -> Result<Self, InvalidSettings> {
        let state = FilterState {
            check: Check::build(&settings.kind)?,
            penalty: Penalty::from_settings(settings)?,
            reason: settings.reason.clone(),
            reply: settings.reply.clone(),
            pass_through: settings.pass_through,
            allow_mod: settings.allow_mod,
            allow_vip: settings.allow_vip,
            allow_sub: settings.allow_sub,
            allow_rewards: settings.allow_rewards.clone(),
        };

        Ok(Self {
            state: Arc::new(state),
        })
    }

    pub fn into_middleware(self) -> Middleware {
        Arc::new(self)
    }
}

impl Layer<BoxedHandler> for Filter {
    type Service = BoxedHandler;

    fn layer(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(FilteredHandler {
            state: Arc::clone(&self.state),
            next,
        })
    }
}

struct FilteredHandler {
    state: Arc<FilterState>,
    next: BoxedHandler,
}

impl Handler for FilteredHandler {
    fn serve(&self, ctx: Arc<ChatContext>) -> BoxFuture<'static, ()> {
        let state = Arc::clone(&self.state);
        let next = Arc::clone(&self.next);

        Box::pin(async move {
            let allowed = state.allows(ctx.message());

            if !allowed {
                debug!(user = ?ctx.message().user(), "Message filtered");
                state.punish(&ctx).await;
            }

            if allowed || state.pass_through {
                next.serve(ctx).await;
            }
        })
    }
}
