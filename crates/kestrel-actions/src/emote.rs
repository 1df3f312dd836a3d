//! Emote image lookup.
//!
//! Native emotes are found through the `emotes` tag. Anything else is looked
//! up by code in the BetterTTV and FrankerFaceZ emote sets of the channel,
//! which are fetched per room and cached for an hour.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use kestrel_core::{Message, TtlCache, tag};
use kestrel_framework::{BoxFuture, BoxedHandler, ChatContext, Handler};

use crate::api::{bttv, ffz};
use crate::error::ActionResult;

const EMOTE_SET_TTL: Duration = Duration::from_secs(60 * 60);

pub const NOT_FOUND_REPLY: &str = "Error: emote not found";
pub const UNAVAILABLE_REPLY: &str = "Error: try again later";

/// Emote code to image URL.
pub type EmoteSet = HashMap<String, String>;

/// Returns the id of the first emote in an `emotes` tag value such as
/// `25:0-4,12-16/1902:6-10`.
pub fn twitch_emote_id(emotes: &str) -> Option<&str> {
    let (id, _) = emotes.split_once(':')?;
    (!id.is_empty()).then_some(id)
}

/// CDN URL of the first native emote in `msg`.
pub fn twitch_emote_url(msg: &Message) -> Option<String> {
    let id = twitch_emote_id(msg.tag(tag::EMOTES)?)?;
    Some(format!(
        "https://static-cdn.jtvnw.net/emoticons/v2/{id}/default/dark/3.0"
    ))
}

/// Provider of the third-party emotes usable in a room.
#[async_trait]
pub trait EmoteSource: Send + Sync {
    async fn emotes(&self, room_id: &str) -> ActionResult<EmoteSet>;
}

/// Global and channel emotes from BetterTTV and FrankerFaceZ.
///
/// Later sources win on a code clash, with FrankerFaceZ channel emotes
/// taking precedence over everything else.
#[derive(Debug, Clone)]
pub struct ExtensionEmotes {
    http: Client,
}

impl ExtensionEmotes {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl EmoteSource for ExtensionEmotes {
    async fn emotes(&self, room_id: &str) -> ActionResult<EmoteSet> {
        info!(room_id = %room_id, "Collecting extension emotes");

        let bttv_global = bttv::global_emotes(&self.http).await?;
        let ffz_global = ffz::global_emotes(&self.http).await?;
        let bttv_user = bttv::user_emotes(&self.http, room_id).await?;
        let ffz_user = ffz::user_emotes(&self.http, room_id).await?;

        let mut set = EmoteSet::new();
        set.extend(bttv_global.iter().map(|e| (e.code.clone(), e.image_url())));
        set.extend(ffz_global.iter().map(|e| (e.code.clone(), e.image_url())));
        set.extend(
            bttv_user
                .channel_emotes
                .iter()
                .chain(&bttv_user.shared_emotes)
                .map(|e| (e.code.clone(), e.image_url())),
        );
        set.extend(ffz_user.iter().map(|e| (e.code.clone(), e.image_url())));

        debug!(room_id = %room_id, count = set.len(), "Collected extension emotes");
        Ok(set)
    }
}

enum Lookup {
    Found(String),
    NotFound,
    Unavailable,
}

struct Inner {
    source: Arc<dyn EmoteSource>,
    sets: TtlCache<Arc<EmoteSet>>,
}

impl Inner {
    async fn emote_set(&self, room_id: &str) -> ActionResult<Arc<EmoteSet>> {
        if let Some(set) = self.sets.get(room_id) {
            return Ok(set);
        }

        let set = Arc::new(self.source.emotes(room_id).await?);
        self.sets.set(room_id, set.clone(), EMOTE_SET_TTL);
        Ok(set)
    }

    async fn lookup(&self, msg: &Message) -> Lookup {
        if let Some(url) = twitch_emote_url(msg) {
            return Lookup::Found(url);
        }

        let Some(room_id) = msg.tag(tag::ROOM_ID) else {
            debug!(raw = %msg.raw, "Room id not found in message");
            return Lookup::NotFound;
        };

        let set = match self.emote_set(room_id).await {
            Ok(set) => set,
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Failed to fetch emotes");
                return Lookup::Unavailable;
            }
        };

        msg.text
            .split_whitespace()
            .find_map(|word| set.get(word))
            .map_or(Lookup::NotFound, |url| Lookup::Found(url.clone()))
    }
}

/// The `emote` action: replies with the image URL of the first emote in the
/// message.
#[derive(Clone)]
pub struct Emote {
    inner: Arc<Inner>,
}

impl Emote {
    pub fn new(source: Arc<dyn EmoteSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                sets: TtlCache::new(),
            }),
        }
    }

    pub fn into_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl Handler for Emote {
    fn serve(&self, ctx: Arc<ChatContext>) -> BoxFuture<'static, ()> {
        let inner = self.inner.clone();

        Box::pin(async move {
            let text = match inner.lookup(ctx.message()).await {
                Lookup::Found(url) => url,
                Lookup::NotFound => {
                    info!(raw = %ctx.message().raw, "Emote not found in message");
                    NOT_FOUND_REPLY.to_string()
                }
                Lookup::Unavailable => UNAVAILABLE_REPLY.to_string(),
            };

            if let Err(e) = ctx.reply(text).await {
                warn!(error = %e, "Failed to send emote reply");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ActionError;
    use crate::testing::{context, drain};

    #[derive(Default)]
    struct FakeEmotes {
        fetches: AtomicUsize,
        failing: bool,
    }

    #[async_trait]
    impl EmoteSource for FakeEmotes {
        async fn emotes(&self, room_id: &str) -> ActionResult<EmoteSet> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return Err(ActionError::Http("connection refused".into()));
            }
            assert_eq!(room_id, "1234");
            Ok(EmoteSet::from([(
                "catJAM".to_string(),
                "https://cdn.betterttv.net/emote/abc/3x".to_string(),
            )]))
        }
    }

    #[test]
    fn test_twitch_emote_id() {
        assert_eq!(twitch_emote_id("25:0-4,12-16/1902:6-10"), Some("25"));
        assert_eq!(twitch_emote_id("emotesv2_abc:0-3"), Some("emotesv2_abc"));
        assert_eq!(twitch_emote_id(""), None);
        assert_eq!(twitch_emote_id(":0-4"), None);
    }

    #[tokio::test]
    async fn test_native_emote_skips_lookup() {
        let source = Arc::new(FakeEmotes::default());
        let handler = Emote::new(source.clone()).into_handler();

        let line = "@emotes=25:7-11;id=e-1;room-id=1234 :u!u@u.tmi.twitch.tv PRIVMSG #chan :!emote Kappa";
        let (ctx, mut rx) = context(line);
        handler.serve(ctx).await;

        let sent = drain(&mut rx);
        assert_eq!(
            sent[0].text,
            "https://static-cdn.jtvnw.net/emoticons/v2/25/default/dark/3.0"
        );
        assert_eq!(sent[0].parent_msg_id.as_deref(), Some("e-1"));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_extension_emote_is_cached_per_room() {
        let source = Arc::new(FakeEmotes::default());
        let handler = Emote::new(source.clone()).into_handler();

        let line = "@room-id=1234 :u!u@u.tmi.twitch.tv PRIVMSG #chan :!emote catJAM";
        for _ in 0..2 {
            let (ctx, mut rx) = context(line);
            handler.serve(ctx).await;
            assert_eq!(
                drain(&mut rx)[0].text,
                "https://cdn.betterttv.net/emote/abc/3x"
            );
        }

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_emote() {
        let handler = Emote::new(Arc::new(FakeEmotes::default())).into_handler();

        for line in [
            "@room-id=1234 :u!u@u.tmi.twitch.tv PRIVMSG #chan :!emote nothing",
            ":u!u@u.tmi.twitch.tv PRIVMSG #chan :!emote catJAM",
        ] {
            let (ctx, mut rx) = context(line);
            handler.serve(ctx).await;
            assert_eq!(drain(&mut rx)[0].text, NOT_FOUND_REPLY);
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_apologizes() {
        let handler = Emote::new(Arc::new(FakeEmotes {
            failing: true,
            ..Default::default()
        }))
        .into_handler();

        let (ctx, mut rx) = context("@room-id=1234 :u!u@u.tmi.twitch.tv PRIVMSG #chan :!emote catJAM");
        handler.serve(ctx).await;

        assert_eq!(drain(&mut rx)[0].text, UNAVAILABLE_REPLY);
    }
}
