//! Outgoing frame formatting.
//!
//! Every function returns a single line without the trailing CRLF; the
//! writer appends it when the frame goes out.

use kestrel_core::HOST_NAME;

/// The public chat endpoint.
pub const DEFAULT_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

/// Prefix identifying an inbound keepalive line.
pub const PING: &str = "PING";

/// Capability that enables the tag block on inbound lines.
pub const CAP_TAGS: &str = "twitch.tv/tags";

/// Capability that enables moderation and state commands.
pub const CAP_COMMANDS: &str = "twitch.tv/commands";

/// Tag carrying the id of the message a reply is threaded under.
pub const REPLY_PARENT_TAG: &str = "reply-parent-msg-id";

pub fn pong() -> String {
    format!("PONG :{HOST_NAME}")
}

pub fn pass(token: &str) -> String {
    format!("PASS {token}")
}

pub fn nick(name: &str) -> String {
    format!("NICK {name}")
}

pub fn cap_req(capability: &str) -> String {
    format!("CAP REQ :{capability}")
}

pub fn join(channel: &str) -> String {
    format!("JOIN #{}", channel.to_lowercase())
}

pub fn privmsg(channel: &str, text: &str) -> String {
    format!(
        "PRIVMSG #{} :{}",
        channel.to_lowercase(),
        collapse_whitespace(text)
    )
}

/// A `PRIVMSG` threaded under `parent_id`.
pub fn reply(parent_id: &str, channel: &str, text: &str) -> String {
    format!("@{REPLY_PARENT_TAG}={parent_id} {}", privmsg(channel, text))
}

/// Collapses every run of whitespace into a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
