//! Ranked standing lookup.
//!
//! Replies with the configured summoner's standing in one ranked queue.
//! The summoner id rarely changes, so it is resolved once and cached.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use kestrel_core::TtlCache;
use kestrel_framework::{BoxFuture, BoxedHandler, ChatContext, Handler};

use crate::api::riot::{LeagueEntry, RankSource, RiotClient};
use crate::error::ActionResult;

const SUMMONER_ID_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub const NOT_FOUND_REPLY: &str = "Rank not found";
pub const UNAVAILABLE_REPLY: &str = "Error: try again later";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueType {
    #[default]
    Solo,
    Flex,
}

impl QueueType {
    /// Queue identifier used by the ranking API.
    pub fn api_name(self) -> &'static str {
        match self {
            Self::Solo => "RANKED_SOLO_5x5",
            Self::Flex => "RANKED_FLEX_SR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EloSettings {
    pub region: String,
    pub summoner_name: String,
    #[serde(default)]
    pub queue_type: QueueType,
}

/// Picks the standing for `queue`. If the API lists the queue more than
/// once, the last entry wins.
pub fn pick_entry(entries: &[LeagueEntry], queue: QueueType) -> Option<&LeagueEntry> {
    entries
        .iter()
        .rev()
        .find(|entry| entry.queue_type == queue.api_name())
}

struct Inner {
    source: Arc<dyn RankSource>,
    summoner_name: String,
    queue: QueueType,
    ids: TtlCache<String>,
}

impl Inner {
    async fn summoner_id(&self) -> ActionResult<String> {
        if let Some(id) = self.ids.get(&self.summoner_name) {
            return Ok(id);
        }

        let id = self.source.summoner_id(&self.summoner_name).await?;
        debug!(summoner = %self.summoner_name, "Resolved summoner id");
        self.ids
            .set(self.summoner_name.clone(), id.clone(), SUMMONER_ID_TTL);
        Ok(id)
    }

    async fn standing(&self) -> ActionResult<Option<LeagueEntry>> {
        let id = self.summoner_id().await?;
        let entries = self.source.league_entries(&id).await?;
        Ok(pick_entry(&entries, self.queue).cloned())
    }
}

/// The `elo` action.
#[derive(Clone)]
pub struct Elo {
    inner: Arc<Inner>,
}

impl Elo {
    pub fn new(source: Arc<dyn RankSource>, settings: &EloSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                summoner_name: settings.summoner_name.clone(),
                queue: settings.queue_type,
                ids: TtlCache::new(),
            }),
        }
    }

    /// Creates the action backed by the live ranking API.
    pub fn with_api_key(
        http: reqwest::Client,
        settings: &EloSettings,
        api_key: &str,
    ) -> ActionResult<Self> {
        let client = RiotClient::new(http, &settings.region, api_key)?;
        Ok(Self::new(Arc::new(client), settings))
    }

    pub fn into_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl Handler for Elo {
    fn serve(&self, ctx: Arc<ChatContext>) -> BoxFuture<'static, ()> {
        let inner = self.inner.clone();

        Box::pin(async move {
            let text = match inner.standing().await {
                Ok(Some(entry)) => entry.to_string(),
                Ok(None) => NOT_FOUND_REPLY.to_string(),
                Err(e) => {
                    warn!(summoner = %inner.summoner_name, error = %e, "Rank lookup failed");
                    UNAVAILABLE_REPLY.to_string()
                }
            };

            if let Err(e) = ctx.reply(text).await {
                warn!(error = %e, "Failed to send rank reply");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::ActionError;
    use crate::testing::{context, drain};

    const LINE: &str = "@id=m-1 :u!u@u.tmi.twitch.tv PRIVMSG #chan :!elo";

    fn entry(queue: &str, tier: &str) -> LeagueEntry {
        LeagueEntry {
            queue_type: queue.into(),
            tier: tier.into(),
            rank: "I".into(),
            summoner_name: "streamer".into(),
            league_points: 10,
            wins: 5,
            losses: 4,
        }
    }

    #[derive(Default)]
    struct FakeRanks {
        lookups: AtomicUsize,
        entries: Vec<LeagueEntry>,
        failing: bool,
    }

    #[async_trait]
    impl RankSource for FakeRanks {
        async fn summoner_id(&self, name: &str) -> ActionResult<String> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(format!("id-{name}"))
        }

        async fn league_entries(&self, summoner_id: &str) -> ActionResult<Vec<LeagueEntry>> {
            assert_eq!(summoner_id, "id-streamer");
            if self.failing {
                return Err(ActionError::Api {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            Ok(self.entries.clone())
        }
    }

    fn settings(queue_type: QueueType) -> EloSettings {
        EloSettings {
            region: "euw".into(),
            summoner_name: "streamer".into(),
            queue_type,
        }
    }

    #[test]
    fn test_pick_last_matching_entry() {
        let entries = vec![
            entry("RANKED_SOLO_5x5", "GOLD"),
            entry("RANKED_FLEX_SR", "SILVER"),
            entry("RANKED_SOLO_5x5", "PLATINUM"),
        ];

        assert_eq!(pick_entry(&entries, QueueType::Solo).unwrap().tier, "PLATINUM");
        assert_eq!(pick_entry(&entries, QueueType::Flex).unwrap().tier, "SILVER");
        assert!(pick_entry(&entries[..1], QueueType::Flex).is_none());
    }

    #[test]
    fn test_queue_type_defaults_to_solo() {
        let settings: EloSettings =
            serde_json::from_str(r#"{"region": "euw", "summonerName": "streamer"}"#).unwrap();
        assert_eq!(settings.queue_type, QueueType::Solo);
    }

    #[tokio::test]
    async fn test_replies_with_standing_and_caches_id() {
        let ranks = Arc::new(FakeRanks {
            entries: vec![entry("RANKED_FLEX_SR", "DIAMOND")],
            ..Default::default()
        });
        let handler = Elo::new(ranks.clone(), &settings(QueueType::Flex)).into_handler();

        for _ in 0..2 {
            let (ctx, mut rx) = context(LINE);
            handler.serve(ctx).await;

            let sent = drain(&mut rx);
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].text, "streamer: DIAMOND I 10 lp, w/l: 5/4");
            assert_eq!(sent[0].parent_msg_id.as_deref(), Some("m-1"));
        }

        assert_eq!(ranks.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unranked_queue() {
        let ranks = Arc::new(FakeRanks {
            entries: vec![entry("RANKED_FLEX_SR", "DIAMOND")],
            ..Default::default()
        });
        let handler = Elo::new(ranks, &settings(QueueType::Solo)).into_handler();

        let (ctx, mut rx) = context(LINE);
        handler.serve(ctx).await;

        assert_eq!(drain(&mut rx)[0].text, NOT_FOUND_REPLY);
    }

    #[tokio::test]
    async fn test_api_failure_apologizes() {
        let ranks = Arc::new(FakeRanks {
            failing: true,
            ..Default::default()
        });
        let handler = Elo::new(ranks, &settings(QueueType::Solo)).into_handler();

        let (ctx, mut rx) = context(LINE);
        handler.serve(ctx).await;

        assert_eq!(drain(&mut rx)[0].text, UNAVAILABLE_REPLY);
    }
}
