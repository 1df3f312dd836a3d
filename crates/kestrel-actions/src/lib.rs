//! # Kestrel Actions
//!
//! The handlers that triggers resolve to.
//!
//! | Action        | Behavior                                              |
//! |---------------|-------------------------------------------------------|
//! | `print`       | Replies with a fixed text                             |
//! | `songRequest` | Forwards a YouTube video id to a music bot            |
//! | `elo`         | Replies with a summoner's ranked standing             |
//! | `emote`       | Replies with the image URL of an emote in the message |
//!
//! Actions never fail the dispatch: errors from external services are
//! logged and, for `elo` and `emote`, answered with an apology.

pub mod api;
pub mod elo;
pub mod emote;
pub mod error;
pub mod print;
pub mod song_request;

pub use api::{HttpClient, http_client};
pub use elo::{Elo, EloSettings, QueueType};
pub use emote::{Emote, EmoteSource, ExtensionEmotes};
pub use error::{ActionError, ActionResult};
pub use print::{PrintSettings, print};
pub use song_request::{SongRequest, SongRequestSettings, youtube_video_id};
