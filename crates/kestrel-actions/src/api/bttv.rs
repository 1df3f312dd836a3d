//! BetterTTV emotes.

use reqwest::Client;
use serde::Deserialize;

use super::get_json;
use crate::error::ActionResult;

const GLOBAL_EMOTES_URL: &str = "https://api.betterttv.net/3/cached/emotes/global";
const USER_EMOTES_URL: &str = "https://api.betterttv.net/3/cached/users/twitch";

#[derive(Debug, Clone, Deserialize)]
pub struct Emote {
    pub id: String,
    pub code: String,
}

impl Emote {
    pub fn image_url(&self) -> String {
        format!("https://cdn.betterttv.net/emote/{}/3x", self.id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEmotes {
    #[serde(default)]
    pub channel_emotes: Vec<Emote>,
    #[serde(default)]
    pub shared_emotes: Vec<Emote>,
}

pub async fn global_emotes(client: &Client) -> ActionResult<Vec<Emote>> {
    get_json(client, GLOBAL_EMOTES_URL).await
}

pub async fn user_emotes(client: &Client, user_id: &str) -> ActionResult<UserEmotes> {
    get_json(client, &format!("{USER_EMOTES_URL}/{user_id}")).await
}
