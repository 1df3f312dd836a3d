//! Canned reply.

use serde::{Deserialize, Serialize};
use tracing::warn;

use kestrel_framework::{BoxedHandler, handler_fn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintSettings {
    pub text: String,
}

/// Replies to the triggering message with a fixed text.
pub fn print(settings: &PrintSettings) -> BoxedHandler {
    let text = settings.text.clone();

    handler_fn(move |ctx| {
        let text = text.clone();
        async move {
            if let Err(e) = ctx.reply(text).await {
                warn!(error = %e, "Failed to send print reply");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, drain};

    #[tokio::test]
    async fn test_replies_with_text() {
        let handler = print(&PrintSettings {
            text: "Commands: !elo !song".into(),
        });

        let (ctx, mut rx) = context("@id=p-1 :u!u@u.tmi.twitch.tv PRIVMSG #chan :!help");
        handler.serve(ctx).await;

        let sent = drain(&mut rx);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "Commands: !elo !song");
        assert_eq!(sent[0].parent_msg_id.as_deref(), Some("p-1"));
    }
}
