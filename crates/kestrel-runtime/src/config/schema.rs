//! Configuration schema definitions.
//!
//! ```yaml
//! debug: false
//! logging:
//!   level: info
//! session:
//!   dial_timeout: 10s
//!   retry_limit: 10
//! channels:
//!   - name: some_channel
//!     chat:
//!       spam: { text: "Follow the channel!", period: 10m }
//!       middlewares:
//!         - type: filter
//!           settings: { type: blockLinks, penalty: deleteMsg }
//!       commands:
//!         - key: hello
//!           action: { type: print, settings: { text: "hi" } }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use kestrel_actions::{EloSettings, PrintSettings, SongRequestSettings};
use kestrel_core::duration::humantime_serde;
use kestrel_framework::middleware::{AutorespondSettings, FilterSettings, SpamSettings};
use kestrel_framework::DEFAULT_COMMAND_PREFIX;
use kestrel_transport::command::DEFAULT_URL;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log the raw line of every dispatched message.
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub session: SessionConfig,

    /// Channels to join. The bot answers only in channels listed here.
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

impl AppConfig {
    /// Channel names in configuration order.
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }
}

// =============================================================================
// Logging
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file for [`LogOutput::File`].
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module levels, e.g. `kestrel_transport: trace`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line of the call site.
    #[serde(default)]
    pub file_location: bool,
}

// =============================================================================
// Session
// =============================================================================

/// Connection and dispatch tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Chat server to dial.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_dial_timeout", with = "humantime_serde")]
    pub dial_timeout: Duration,

    /// Dial attempts per reconnect before the run gives up.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Base wait between dial attempts. The first retry is immediate, later
    /// ones wait this long and double each time.
    #[serde(default = "default_initial_backoff", with = "humantime_serde")]
    pub initial_backoff: Duration,

    /// Capacity of the outgoing response queue.
    #[serde(default = "default_response_buffer")]
    pub response_buffer: usize,

    #[serde(default = "default_command_prefix")]
    pub command_prefix: char,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            dial_timeout: default_dial_timeout(),
            retry_limit: default_retry_limit(),
            initial_backoff: default_initial_backoff(),
            response_buffer: default_response_buffer(),
            command_prefix: default_command_prefix(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_URL.to_string()
}

fn default_dial_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_retry_limit() -> u32 {
    10
}

fn default_initial_backoff() -> Duration {
    Duration::from_secs(2)
}

fn default_response_buffer() -> usize {
    kestrel_framework::DEFAULT_QUEUE_CAPACITY
}

fn default_command_prefix() -> char {
    DEFAULT_COMMAND_PREFIX
}

// =============================================================================
// Channels
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel name without the leading `#`.
    pub name: String,

    /// Chat handling. A channel without it is joined but never answered.
    #[serde(default)]
    pub chat: Option<ChatConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Periodic message sent while the chat is active.
    #[serde(default)]
    pub spam: Option<SpamSettings>,

    /// Middlewares around every trigger of the channel, outermost first.
    #[serde(default)]
    pub middlewares: Vec<MiddlewareConfig>,

    /// Triggers keyed by channel-points reward id. Checked before commands.
    #[serde(default)]
    pub rewards: Vec<TriggerConfig>,

    /// Triggers keyed by command word, without the prefix.
    #[serde(default)]
    pub commands: Vec<TriggerConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub key: String,

    pub action: ActionConfig,

    #[serde(default)]
    pub middlewares: Vec<MiddlewareConfig>,
}

/// An action descriptor: `{ type: <name>, settings: {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "settings", rename_all = "camelCase")]
pub enum ActionConfig {
    Print(PrintSettings),
    SongRequest(SongRequestSettings),
    Elo(EloSettings),
    Emote,
}

impl ActionConfig {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Print(_) => "print",
            Self::SongRequest(_) => "songRequest",
            Self::Elo(_) => "elo",
            Self::Emote => "emote",
        }
    }
}

/// A middleware descriptor: `{ type: <name>, settings: {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "settings", rename_all = "camelCase")]
pub enum MiddlewareConfig {
    Filter(FilterSettings),
    Autorespond(AutorespondSettings),
}

impl MiddlewareConfig {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Filter(_) => "filter",
            Self::Autorespond(_) => "autorespond",
        }
    }
}
