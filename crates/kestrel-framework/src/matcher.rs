//! Routing keys.
//!
//! A [`KeyMatcher`] extracts the string a [`Mux`](crate::Mux) looks up in
//! its table. An absent or empty key means the message does not match.

use kestrel_core::Message;

/// Default prefix that marks a chat command.
pub const DEFAULT_COMMAND_PREFIX: char = '!';

/// Extracts a routing key from a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatcher {
    /// The message command, e.g. `PRIVMSG`.
    Type,
    /// The target channel.
    Channel,
    /// The command word of a text starting with `prefix`, up to the first
    /// space. The text must be at least two characters long.
    Command { prefix: char },
    /// The channel-points reward id tag.
    Reward,
}

impl KeyMatcher {
    pub fn command() -> Self {
        Self::Command {
            prefix: DEFAULT_COMMAND_PREFIX,
        }
    }

    /// Returns the key for `msg`, if it has a non-empty one.
    pub fn key<'a>(&self, msg: &'a Message) -> Option<&'a str> {
        let key = match self {
            Self::Type => Some(msg.command.as_str()),
            Self::Channel => msg.channel(),
            Self::Command { prefix } => command_word(&msg.text, *prefix),
            Self::Reward => msg.reward_id(),
        };

        key.filter(|key| !key.is_empty())
    }
}

fn command_word(text: &str, prefix: char) -> Option<&str> {
    let body = text.strip_prefix(prefix)?;
    if body.is_empty() {
        return None;
    }

    let end = body.find(' ').unwrap_or(body.len());
    Some(&body[..end])
}
