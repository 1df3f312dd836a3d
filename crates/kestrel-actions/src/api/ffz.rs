//! FrankerFaceZ emotes, served through the BetterTTV cache.

use reqwest::Client;
use serde::Deserialize;

use super::get_json;
use crate::error::ActionResult;

const GLOBAL_EMOTES_URL: &str = "https://api.betterttv.net/3/cached/frankerfacez/emotes/global";
const USER_EMOTES_URL: &str = "https://api.betterttv.net/3/cached/frankerfacez/users/twitch";

#[derive(Debug, Clone, Deserialize)]
pub struct Emote {
    pub id: u64,
    pub code: String,
}

impl Emote {
    pub fn image_url(&self) -> String {
        format!("https://cdn.frankerfacez.com/emote/{}/4", self.id)
    }
}

pub async fn global_emotes(client: &Client) -> ActionResult<Vec<Emote>> {
    get_json(client, GLOBAL_EMOTES_URL).await
}

pub async fn user_emotes(client: &Client, user_id: &str) -> ActionResult<Vec<Emote>> {
    get_json(client, &format!("{USER_EMOTES_URL}/{user_id}")).await
}
