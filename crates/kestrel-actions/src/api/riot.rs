//! League of Legends ranking API.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{ActionError, ActionResult};

const API_DOMAIN: &str = "api.riotgames.com";

/// Maps a short region name to its platform routing value.
pub fn platform(region: &str) -> Option<&'static str> {
    let platform = match region {
        "euw" => "euw1",
        "ru" => "ru",
        "na" => "na1",
        "br" => "br1",
        "eune" => "eun1",
        "jp" => "jp1",
        "kr" => "kr",
        "tr" => "tr1",
        "oce" => "oc1",
        "la1" => "la1",
        "la2" => "la2",
        _ => return None,
    };
    Some(platform)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Summoner {
    pub id: String,
}

/// One ranked queue standing of a summoner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    pub queue_type: String,
    pub tier: String,
    pub rank: String,
    pub summoner_name: String,
    pub league_points: i64,
    pub wins: i64,
    pub losses: i64,
}

impl fmt::Display for LeagueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} {} lp, w/l: {}/{}",
            self.summoner_name, self.tier, self.rank, self.league_points, self.wins, self.losses
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: ErrorStatus,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    message: String,
}

/// Source of ranked standings.
#[async_trait]
pub trait RankSource: Send + Sync {
    /// Resolves a summoner name to its id.
    async fn summoner_id(&self, name: &str) -> ActionResult<String>;

    /// Returns every ranked queue entry of a summoner.
    async fn league_entries(&self, summoner_id: &str) -> ActionResult<Vec<LeagueEntry>>;
}

/// Client for the regional ranking API.
#[derive(Clone)]
pub struct RiotClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RiotClient {
    pub fn new(http: Client, region: &str, api_key: impl Into<String>) -> ActionResult<Self> {
        let platform =
            platform(region).ok_or_else(|| ActionError::UnknownRegion(region.to_string()))?;

        Ok(Self {
            http,
            base_url: format!("https://{platform}.{API_DOMAIN}"),
            api_key: api_key.into(),
        })
    }

    /// Builds the request URL. Each segment is percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> ActionResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ActionError::Http(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ActionError::Http(format!("{} cannot take a path", self.base_url)))?
            .clear()
            .extend(segments);
        url.query_pairs_mut().append_pair("api_key", &self.api_key);
        Ok(url)
    }

    async fn request<T: serde::de::DeserializeOwned>(&self, segments: &[&str]) -> ActionResult<T> {
        let url = self.endpoint(segments)?;
        debug!(path = url.path(), "Riot API request");

        let resp = self.http.get(url).send().await?;

        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            let body: ErrorBody = resp.json().await.unwrap_or_default();
            return Err(ActionError::Api {
                status: status.as_u16(),
                message: body.status.message,
            });
        }

        Ok(resp.json().await?)
    }
}

impl fmt::Debug for RiotClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiotClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RankSource for RiotClient {
    async fn summoner_id(&self, name: &str) -> ActionResult<String> {
        let summoner: Summoner = self
            .request(&["lol", "summoner", "v4", "summoners", "by-name", name])
            .await?;
        Ok(summoner.id)
    }

    async fn league_entries(&self, summoner_id: &str) -> ActionResult<Vec<LeagueEntry>> {
        self.request(&["lol", "league", "v4", "entries", "by-summoner", summoner_id])
            .await
    }
}
