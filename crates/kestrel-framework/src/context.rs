//! Per-message context handed to handlers.
//!
//! A [`ChatContext`] pairs the inbound [`Message`] with a write-only
//! [`Responder`]. The session's writer task holds the only receiving end of
//! the queue, so responses flow one way: handler, queue, connection.
//!
//! The queue is bounded. When it is full, [`ChatContext::send`] and friends
//! wait for space, which is the only backpressure between handlers and the
//! connection.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

use kestrel_core::Message;

use crate::error::{ResponseError, ResponseResult};

/// Default capacity of the response queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// An outgoing chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Target channel without the leading `#`.
    pub channel: String,
    pub text: String,
    /// Id of the message this response is threaded under.
    pub parent_msg_id: Option<String>,
}

/// Write-only handle to the response queue.
#[derive(Debug, Clone)]
pub struct Responder {
    tx: mpsc::Sender<Response>,
}

impl Responder {
    /// Enqueues a response, waiting while the queue is full.
    pub async fn submit(&self, response: Response) -> ResponseResult<()> {
        trace!(channel = %response.channel, "Queueing response");
        self.tx
            .send(response)
            .await
            .map_err(|_| ResponseError::QueueClosed)
    }
}

/// Creates a bounded response queue.
pub fn response_queue(capacity: usize) -> (Responder, mpsc::Receiver<Response>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Responder { tx }, rx)
}

/// The context for one dispatched message.
#[derive(Debug)]
pub struct ChatContext {
    message: Message,
    responder: Responder,
}

impl ChatContext {
    pub fn new(message: Message, responder: Responder) -> Self {
        Self { message, responder }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Returns the channel-points reward id of the message, if any.
    pub fn reward_id(&self) -> Option<&str> {
        self.message.reward_id()
    }

    fn channel(&self) -> ResponseResult<String> {
        self.message
            .channel()
            .map(str::to_string)
            .ok_or(ResponseError::MissingField("channel"))
    }

    fn user(&self) -> ResponseResult<&str> {
        self.message
            .user()
            .ok_or(ResponseError::MissingField("user"))
    }

    /// Sends `text` to the message's channel.
    pub async fn send(&self, text: impl Into<String>) -> ResponseResult<()> {
        self.responder
            .submit(Response {
                channel: self.channel()?,
                text: text.into(),
                parent_msg_id: None,
            })
            .await
    }

    /// Sends `text` threaded under the message. Without a message id this is
    /// a plain [`send`](Self::send).
    pub async fn reply(&self, text: impl Into<String>) -> ResponseResult<()> {
        self.responder
            .submit(Response {
                channel: self.channel()?,
                text: text.into(),
                parent_msg_id: self.message.id().map(str::to_string),
            })
            .await
    }

    /// Times out the sender of the message.
    pub async fn timeout(&self, duration: Duration, reason: &str) -> ResponseResult<()> {
        let user = self.user()?.to_string();
        self.timeout_user(&user, duration, reason).await
    }

    pub async fn timeout_user(
        &self,
        user: &str,
        duration: Duration,
        reason: &str,
    ) -> ResponseResult<()> {
        let secs = duration.as_secs();
        self.send(format!("/timeout {user} {secs} {reason}")).await
    }

    /// Bans the sender of the message.
    pub async fn ban(&self, reason: &str) -> ResponseResult<()> {
        let user = self.user()?.to_string();
        self.ban_user(&user, reason).await
    }

    pub async fn ban_user(&self, user: &str, reason: &str) -> ResponseResult<()> {
        self.send(format!("/ban {user} {reason}")).await
    }

    /// Deletes the message.
    pub async fn delete(&self) -> ResponseResult<()> {
        let id = self
            .message
            .id()
            .ok_or(ResponseError::MissingField("id"))?
            .to_string();
        self.send(format!("/delete {id}")).await
    }
}
