//! Song requests from YouTube links.
//!
//! Finds the first link in the message, extracts the YouTube video id and
//! forwards it to another bot with `<requestCmd> <id>`. Messages without a
//! usable link are dropped.

use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use kestrel_framework::{BoxFuture, BoxedHandler, ChatContext, Handler, InvalidSettings};

const LINK_PATTERN: &str = r"(http(s)?://.)?(www\.)?[-a-zA-Z0-9@:%._+~#=]{2,256}\.[a-z]{2,6}\b([-a-zA-Z0-9@:%_+.~#?&/=]*)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRequestSettings {
    /// Command of the music bot, e.g. `!sr`.
    pub request_cmd: String,
}

/// Extracts a video id from a YouTube link. Links without a scheme are read
/// as `https`.
pub fn youtube_video_id(link: &str) -> Option<String> {
    let url = Url::parse(link)
        .or_else(|_| Url::parse(&format!("https://{link}")))
        .ok()?;

    let id = match url.host_str()? {
        "www.youtube.com" | "youtube.com" | "m.youtube.com" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        "youtu.be" => Some(url.path().trim_matches('/').to_string()),
        _ => None,
    };

    id.filter(|id| !id.is_empty())
}

pub struct SongRequest {
    request_cmd: String,
    links: Regex,
}

impl SongRequest {
    pub fn new(settings: &SongRequestSettings) -> Result<Self, InvalidSettings> {
        let links = Regex::new(LINK_PATTERN)
            .map_err(|e| InvalidSettings::new(format!("bad link pattern: {e}")))?;

        Ok(Self {
            request_cmd: settings.request_cmd.clone(),
            links,
        })
    }

    pub fn into_handler(self) -> BoxedHandler {
        Arc::new(self)
    }

    fn request_text(&self, text: &str) -> Option<String> {
        let link = self.links.find(text)?;
        let id = youtube_video_id(link.as_str())?;
        Some(format!("{} {}", self.request_cmd, id))
    }
}

impl Handler for SongRequest {
    fn serve(&self, ctx: Arc<ChatContext>) -> BoxFuture<'static, ()> {
        let request = self.request_text(&ctx.message().text);

        Box::pin(async move {
            let Some(request) = request else {
                debug!(text = %ctx.message().text, "No song link found");
                return;
            };

            if let Err(e) = ctx.send(request).await {
                warn!(error = %e, "Failed to send song request");
            }
        })
    }
}
