//! Chat protocol messages.
//!
//! A [`Message`] is an immutable snapshot of one inbound protocol line:
//!
//! ```text
//! @badges=moderator/1;id=abc :user!user@user.tmi.twitch.tv PRIVMSG #chan :!hello
//! └──────── tags ─────────┘ └──────── prefix ────────────┘ └─cmd─┘ └chan┘ └text┘
//! ```
//!
//! Parsing never fails. Each step consumes a fixed piece of the line from
//! left to right and leaves its field empty when the piece is missing, so a
//! malformed line degrades to a message with partial fields.

use std::collections::HashMap;

/// The server host name that terminates the prefix of server-relayed lines.
pub const HOST_NAME: &str = "tmi.twitch.tv";

/// Well-known message commands.
pub mod kind {
    pub const PRIVMSG: &str = "PRIVMSG";
    pub const PART: &str = "PART";
    pub const JOIN: &str = "JOIN";
    pub const PING: &str = "PING";
    pub const CLEARCHAT: &str = "CLEARCHAT";
    pub const CLEARMSG: &str = "CLEARMSG";
    pub const HOSTTARGET: &str = "HOSTTARGET";
    pub const NOTICE: &str = "NOTICE";
    pub const RECONNECT: &str = "RECONNECT";
    pub const ROOMSTATE: &str = "ROOMSTATE";
    pub const USERNOTICE: &str = "USERNOTICE";
    pub const USERSTATE: &str = "USERSTATE";
    pub const GLOBALUSERSTATE: &str = "GLOBALUSERSTATE";
}

/// Tag keys the bot reads.
pub mod tag {
    pub const ID: &str = "id";
    pub const BADGES: &str = "badges";
    pub const CUSTOM_REWARD_ID: &str = "custom-reward-id";
    pub const ROOM_ID: &str = "room-id";
    pub const EMOTES: &str = "emotes";
}

/// One parsed protocol line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Tag block attributes; empty when the line carries no tags.
    pub tags: HashMap<String, String>,
    /// The command verb, e.g. `PRIVMSG`.
    pub command: String,
    /// Target channel without the leading `#`.
    pub channel: Option<String>,
    /// Trailing text after the first `:` of the parameters.
    pub text: String,
    /// Sender login, when the prefix names one.
    pub user: Option<String>,
    /// The original line.
    pub raw: String,
}

impl Message {
    /// Parses a raw protocol line. Never fails.
    pub fn parse(raw: &str) -> Self {
        let (tags, rest) = parse_tags(raw);
        let (user, rest) = parse_user(rest);
        let (command, rest) = parse_command(rest);
        let (channel, rest) = parse_channel(rest);
        let text = parse_text(rest);

        Self {
            tags,
            command: command.to_string(),
            channel: channel.map(str::to_string),
            text: text.to_string(),
            user: user.map(str::to_string),
            raw: raw.to_string(),
        }
    }

    /// Returns the value of a tag.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Returns the message id used to thread replies.
    pub fn id(&self) -> Option<&str> {
        self.tag(tag::ID).filter(|id| !id.is_empty())
    }

    /// Returns the channel-points reward id, if the message redeems one.
    pub fn reward_id(&self) -> Option<&str> {
        self.tag(tag::CUSTOM_REWARD_ID)
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Returns `true` if the `badges` tag mentions `badge`.
    pub fn has_badge(&self, badge: &str) -> bool {
        self.tag(tag::BADGES)
            .is_some_and(|badges| badges.contains(badge))
    }

    pub fn is_broadcaster(&self) -> bool {
        self.has_badge("broadcaster")
    }

    pub fn is_moderator(&self) -> bool {
        self.has_badge("moderator")
    }

    pub fn is_vip(&self) -> bool {
        self.has_badge("vip")
    }

    pub fn is_subscriber(&self) -> bool {
        self.has_badge("subscriber")
    }
}

impl From<&str> for Message {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Splits `s` at the first space, dropping the space itself.
fn split_token(s: &str) -> (&str, &str) {
    match s.find(' ') {
        Some(end) => (&s[..end], &s[end + 1..]),
        None => (s, ""),
    }
}

fn parse_tags(raw: &str) -> (HashMap<String, String>, &str) {
    let Some(rest) = raw.strip_prefix('@') else {
        return (HashMap::new(), raw);
    };

    let (block, tail) = split_token(rest);

    let tags = block
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.to_string(), value.replace("\\s", " ")))
        .collect();

    (tags, tail)
}

fn parse_user(rest: &str) -> (Option<&str>, &str) {
    if !rest.starts_with(':') {
        return (None, rest);
    }

    let (prefix, tail) = split_token(rest);

    // Only the prefix token is searched, so a host name in the text never
    // counts as a prefix.
    let Some(host_off) = prefix.find(HOST_NAME) else {
        return (None, rest);
    };

    // `:tmi.twitch.tv` is the server itself.
    if host_off == 1 {
        return (None, tail);
    }

    // `user@user.tmi.twitch.tv`: the user sits between `@` and the
    // character preceding the host.
    let mut head = prefix[..host_off].chars();
    head.next_back();
    let head = head.as_str();

    let user = head
        .find('@')
        .map(|at_off| &head[at_off + 1..])
        .filter(|user| !user.is_empty());

    (user, tail)
}

fn parse_command(rest: &str) -> (&str, &str) {
    split_token(rest)
}

fn parse_channel(rest: &str) -> (Option<&str>, &str) {
    let Some(rest) = rest.strip_prefix('#') else {
        return (None, rest);
    };

    let (channel, tail) = split_token(rest);
    (Some(channel), tail)
}

fn parse_text(rest: &str) -> &str {
    rest.split_once(':').map_or("", |(_, text)| text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_ping() {
        let msg = Message::parse("PING :tmi.twitch.tv");
        assert_eq!(msg.command, kind::PING);
        assert_eq!(msg.text, "tmi.twitch.tv");
        assert!(msg.tags.is_empty());
        assert_eq!(msg.channel, None);
        assert_eq!(msg.user, None);
    }

    #[test]
    fn test_parse_server_line_with_channel() {
        let msg = Message::parse(":tmi.twitch.tv HOSTTARGET #generic_streamer :- 0");
        assert_eq!(msg.command, kind::HOSTTARGET);
        assert_eq!(msg.channel(), Some("generic_streamer"));
        assert_eq!(msg.user, None);
        assert_eq!(msg.text, "- 0");
    }

    #[test]
    fn test_parse_privmsg() {
        let raw = "@badge-info=;badges=;client-nonce=nonce-value;color=#FFFFFF;display-name=Twitch_Viewer;emotes=;flags=some-flag;id=some-uuid;mod=0;room-id=7777777;subscriber=0;tmi-sent-ts=1627670607601;turbo=0;user-id=3333333;user-type= :twitch_viewer!twitch_viewer@twitch_viewer.tmi.twitch.tv PRIVMSG #twitch_streamer :hello";
        let msg = Message::parse(raw);

        assert_eq!(msg.command, kind::PRIVMSG);
        assert_eq!(msg.channel(), Some("twitch_streamer"));
        assert_eq!(msg.user(), Some("twitch_viewer"));
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.raw, raw);
        assert_eq!(msg.tags.len(), 15);
        assert_eq!(msg.tag("color"), Some("#FFFFFF"));
        assert_eq!(msg.tag("user-type"), Some(""));
        assert_eq!(msg.id(), Some("some-uuid"));
    }

    #[test]
    fn test_tag_space_escape() {
        let raw = r"@msg-id=raid;system-msg=80\sraiders\sfrom\sRaider\shave\sjoined!;login=raider :tmi.twitch.tv USERNOTICE #pro_channel";
        let msg = Message::parse(raw);

        assert_eq!(msg.command, kind::USERNOTICE);
        assert_eq!(msg.channel(), Some("pro_channel"));
        assert_eq!(msg.text, "");
        assert_eq!(
            msg.tags,
            tags(&[
                ("msg-id", "raid"),
                ("system-msg", "80 raiders from Raider have joined!"),
                ("login", "raider"),
            ])
        );
    }

    #[test]
    fn test_tag_without_separator_is_ignored() {
        let msg = Message::parse("@flag;a=b :tmi.twitch.tv NOTICE #c :x");
        assert_eq!(msg.tags, tags(&[("a", "b")]));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let msg = Message::parse("@url=a=b :tmi.twitch.tv NOTICE #c :x");
        assert_eq!(msg.tag("url"), Some("a=b"));
    }

    #[test]
    fn test_parse_wildcard_target() {
        let msg = Message::parse(":tmi.twitch.tv CAP * ACK :twitch.tv/tags");
        assert_eq!(msg.command, "CAP");
        assert_eq!(msg.channel, None);
        assert_eq!(msg.text, "twitch.tv/tags");

        let msg = Message::parse(":tmi.twitch.tv NOTICE * :Login authentication failed");
        assert_eq!(msg.command, kind::NOTICE);
        assert_eq!(msg.text, "Login authentication failed");
    }

    #[test]
    fn test_parse_numeric_reply() {
        let msg = Message::parse(":tmi.twitch.tv 001 twitch_viewer :Welcome, GLHF!");
        assert_eq!(msg.command, "001");
        assert_eq!(msg.channel, None);
        assert_eq!(msg.text, "Welcome, GLHF!");
    }

    #[test]
    fn test_parse_without_channel_or_text() {
        let msg = Message::parse(
            "@badge-info=;badges=;display-name=twitch_viewer;user-id=123 :tmi.twitch.tv GLOBALUSERSTATE",
        );
        assert_eq!(msg.command, kind::GLOBALUSERSTATE);
        assert_eq!(msg.channel, None);
        assert_eq!(msg.text, "");
        assert_eq!(msg.tag("display-name"), Some("twitch_viewer"));
    }

    #[test]
    fn test_degraded_lines() {
        let msg = Message::parse("");
        assert_eq!(msg.command, "");
        assert!(msg.tags.is_empty());

        let msg = Message::parse("@a=b");
        assert_eq!(msg.tags, tags(&[("a", "b")]));
        assert_eq!(msg.command, "");

        // Prefix without the server host is left for the command step.
        let msg = Message::parse(":someone PRIVMSG #c :hi");
        assert_eq!(msg.command, ":someone");
        assert_eq!(msg.user, None);
    }

    #[test]
    fn test_non_ascii_prefix() {
        let msg = Message::parse(":a@b\u{e9}tmi.twitch.tv PRIVMSG #c :hi");
        assert_eq!(msg.command, kind::PRIVMSG);
        assert_eq!(msg.user(), Some("b"));
        assert_eq!(msg.text, "hi");

        let msg = Message::parse(":\u{e9}@\u{e9}\u{e9}tmi.twitch.tv PRIVMSG #c :hi");
        assert_eq!(msg.user(), Some("\u{e9}"));

        let msg = Message::parse(":a@\u{e9}tmi.twitch.tv PRIVMSG #c :hi");
        assert_eq!(msg.user, None);
        assert_eq!(msg.channel(), Some("c"));
    }

    #[test]
    fn test_host_name_in_text_is_not_a_prefix() {
        let msg = Message::parse(":someone PRIVMSG #c :see tmi.twitch.tv");
        assert_eq!(msg.user, None);
        assert_eq!(msg.command, ":someone");
    }

    #[test]
    fn test_badges() {
        let msg = Message::parse(
            "@badges=moderator/1,subscriber/12 :u!u@u.tmi.twitch.tv PRIVMSG #c :hi",
        );
        assert!(msg.is_moderator());
        assert!(msg.is_subscriber());
        assert!(!msg.is_vip());
        assert!(!msg.is_broadcaster());

        let plain = Message::parse(":u!u@u.tmi.twitch.tv PRIVMSG #c :hi");
        assert!(!plain.is_moderator());
    }
}
