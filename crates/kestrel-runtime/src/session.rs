//! The session runner.
//!
//! One [`Session`] drives the connection lifecycle for the whole process:
//!
//! ```text
//! Dialing ─► Authenticating ─► Joining ─► Serving ─► Disconnected ─┐
//!    ▲  │                                                          │
//!    │  └─► retries exhausted: the run fails                       │
//!    └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! While serving, the read loop is the only reader of the connection. Each
//! line is parsed and handed to the handler tree on its own task; handlers
//! answer through a bounded response queue that a single writer task drains
//! onto the connection.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use kestrel_core::Message;
use kestrel_framework::{BoxedHandler, ChatContext, Response, response_queue};
use kestrel_transport::command::{CAP_COMMANDS, CAP_TAGS};
use kestrel_transport::{Connection, Dialer, FrameWriter, TransportError, dial};

use crate::backoff::{Retry, RetryPolicy, retry};
use crate::config::{AppConfig, SessionConfig};
use crate::credentials::Credentials;
use crate::error::{RuntimeError, RuntimeResult};

/// Keeps the bot connected and dispatches what it reads.
pub struct Session {
    dialer: Arc<dyn Dialer>,
    handler: BoxedHandler,
    creds: Credentials,
    channels: Vec<String>,
    config: SessionConfig,
}

impl Session {
    pub fn new(
        dialer: Arc<dyn Dialer>,
        handler: BoxedHandler,
        creds: Credentials,
        config: &AppConfig,
    ) -> Self {
        Self {
            dialer,
            handler,
            creds,
            channels: config.channel_names(),
            config: config.session.clone(),
        }
    }

    /// Runs sessions back to back until `cancel` fires or a reconnect cycle
    /// runs out of dial attempts.
    ///
    /// Returns `Ok(())` only when cancelled.
    pub async fn run(&self, cancel: CancellationToken) -> RuntimeResult<()> {
        info!(
            endpoint = %self.dialer.endpoint(),
            channels = ?self.channels,
            "Starting session runner"
        );

        loop {
            let conn = match self.connect(&cancel).await {
                Retry::Done(conn) => conn,
                Retry::Exhausted { attempts, last } => {
                    error!(attempts, error = %last, "Giving up on dialing");
                    return Err(RuntimeError::RetriesExhausted { attempts, last });
                }
                Retry::Cancelled => break,
            };

            info!(endpoint = %self.dialer.endpoint(), "Connected");

            if let Err(e) = self.serve_once(conn, &cancel).await {
                warn!(error = %e, "Connection interrupted");
            }

            if cancel.is_cancelled() {
                break;
            }
        }

        info!("Session runner stopped");
        Ok(())
    }

    /// Dials with a fresh backoff.
    async fn connect(&self, cancel: &CancellationToken) -> Retry<Connection, TransportError> {
        let policy = RetryPolicy::new(self.config.retry_limit, self.config.initial_backoff);
        let timeout = self.config.dial_timeout;

        retry(policy, cancel, |attempt| {
            debug!(attempt, "Dial attempt");
            dial(self.dialer.as_ref(), timeout)
        })
        .await
    }

    /// Authenticates, joins, and serves one connection until it fails or
    /// `cancel` fires. The connection is closed either way.
    pub async fn serve_once(
        &self,
        mut conn: Connection,
        cancel: &CancellationToken,
    ) -> RuntimeResult<()> {
        let result = self.serve(&mut conn, cancel).await;

        if let Err(e) = conn.close().await {
            debug!(error = %e, "Failed to close connection");
        }

        result
    }

    async fn serve(&self, conn: &mut Connection, cancel: &CancellationToken) -> RuntimeResult<()> {
        conn.request_caps(&[CAP_TAGS, CAP_COMMANDS]).await?;
        conn.login(self.creds.twitch_user(), self.creds.twitch_pass())
            .await?;
        debug!(user = %self.creds.twitch_user(), "Logged in");

        for channel in &self.channels {
            conn.join(channel).await?;
            info!(channel = %channel, "Joined channel");
        }

        let (responder, responses) = response_queue(self.config.response_buffer);
        let stop_writer = CancellationToken::new();
        let writer = tokio::spawn(write_responses(
            conn.writer(),
            responses,
            stop_writer.clone(),
        ));

        let result = loop {
            let line = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(()),
                line = conn.read_line() => match line {
                    Ok(line) => line,
                    Err(e) => break Err(RuntimeError::from(e)),
                },
            };

            trace!(line = %line, "Received line");
            let ctx = Arc::new(ChatContext::new(Message::parse(&line), responder.clone()));
            tokio::spawn(self.handler.serve(ctx));
        };

        stop_writer.cancel();
        if let Err(e) = writer.await {
            warn!(error = %e, "Response writer task failed");
        }

        result
    }
}

/// Drains the response queue onto the connection until `stop` fires.
async fn write_responses(
    writer: FrameWriter,
    mut responses: mpsc::Receiver<Response>,
    stop: CancellationToken,
) {
    loop {
        let response = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            response = responses.recv() => match response {
                Some(response) => response,
                None => break,
            },
        };

        let result = match &response.parent_msg_id {
            Some(parent) => {
                writer
                    .reply(parent, &response.channel, &response.text)
                    .await
            }
            None => writer.privmsg(&response.channel, &response.text).await,
        };

        if let Err(e) = result {
            warn!(channel = %response.channel, error = %e, "Failed to send response");
        }
    }

    // Handlers still running now get `QueueClosed`.
    responses.close();
}
