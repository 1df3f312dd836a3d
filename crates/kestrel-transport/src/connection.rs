//! Connection handling.
//!
//! A [`Connection`] is created per dial attempt. The read half stays with the
//! session's read loop; the write half is a cloneable [`FrameWriter`] so the
//! keepalive reply and the response writer task share one serialized path.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::command;
use crate::error::{TransportError, TransportResult};

// =============================================================================
// Frame traits
// =============================================================================

/// The inbound half of a connection.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Returns the next text frame, or `None` once the peer has closed.
    ///
    /// A frame may hold several newline-separated lines.
    async fn next_frame(&mut self) -> TransportResult<Option<String>>;
}

/// The outbound half of a connection.
#[async_trait]
pub trait FrameSink: Send {
    /// Sends one frame as-is.
    async fn send_frame(&mut self, frame: String) -> TransportResult<()>;

    /// Closes the outbound half.
    async fn close(&mut self) -> TransportResult<()>;
}

/// Boxed inbound half.
pub type BoxedSource = Box<dyn FrameSource>;

/// Boxed outbound half.
pub type BoxedSink = Box<dyn FrameSink>;

/// Opens raw connections to a chat server.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// The endpoint, for logging.
    fn endpoint(&self) -> &str;

    /// Opens a new connection.
    async fn dial(&self) -> TransportResult<(BoxedSource, BoxedSink)>;
}

/// Dials once, failing with [`TransportError::DialTimeout`] if the dialer
/// takes longer than `timeout`.
pub async fn dial(dialer: &dyn Dialer, timeout: Duration) -> TransportResult<Connection> {
    debug!(url = %dialer.endpoint(), ?timeout, "Dialing");

    let (source, sink) = tokio::time::timeout(timeout, dialer.dial())
        .await
        .map_err(|_| TransportError::DialTimeout(timeout))??;

    Ok(Connection::new(source, sink))
}

// =============================================================================
// Writer
// =============================================================================

/// Cloneable, serialized write path of a connection.
#[derive(Clone)]
pub struct FrameWriter {
    sink: Arc<Mutex<BoxedSink>>,
}

impl FrameWriter {
    fn new(sink: BoxedSink) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Writes one CRLF-terminated frame.
    pub async fn write_frame(&self, line: &str) -> TransportResult<()> {
        trace!(frame = %line, "Writing frame");
        self.sink.lock().await.send_frame(format!("{line}\r\n")).await
    }

    pub async fn privmsg(&self, channel: &str, text: &str) -> TransportResult<()> {
        self.write_frame(&command::privmsg(channel, text)).await
    }

    pub async fn reply(&self, parent_id: &str, channel: &str, text: &str) -> TransportResult<()> {
        self.write_frame(&command::reply(parent_id, channel, text))
            .await
    }

    pub async fn close(&self) -> TransportResult<()> {
        self.sink.lock().await.close().await
    }
}

impl std::fmt::Debug for FrameWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameWriter").finish_non_exhaustive()
    }
}

// =============================================================================
// Connection
// =============================================================================

/// One live chat connection.
pub struct Connection {
    source: BoxedSource,
    pending: VecDeque<String>,
    writer: FrameWriter,
}

impl Connection {
    pub fn new(source: BoxedSource, sink: BoxedSink) -> Self {
        Self {
            source,
            pending: VecDeque::new(),
            writer: FrameWriter::new(sink),
        }
    }

    /// Returns a handle to the write path.
    pub fn writer(&self) -> FrameWriter {
        self.writer.clone()
    }

    /// Reads the next non-keepalive line.
    ///
    /// Keepalive lines are answered immediately and never returned. Dropping
    /// the returned future loses no buffered lines.
    pub async fn read_line(&mut self) -> TransportResult<String> {
        loop {
            while let Some(line) = self.pending.pop_front() {
                if line.starts_with(command::PING) {
                    trace!("Received keepalive, sending pong");
                    self.writer.write_frame(&command::pong()).await?;
                    continue;
                }
                return Ok(line);
            }

            let frame = self
                .source
                .next_frame()
                .await?
                .ok_or_else(|| TransportError::closed("stream ended"))?;

            self.pending.extend(
                frame
                    .split('\n')
                    .map(|line| line.strip_suffix('\r').unwrap_or(line))
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        }
    }

    pub async fn write_frame(&self, line: &str) -> TransportResult<()> {
        self.writer.write_frame(line).await
    }

    /// Requests each capability with its own `CAP REQ`.
    pub async fn request_caps(&self, capabilities: &[&str]) -> TransportResult<()> {
        for capability in capabilities {
            self.write_frame(&command::cap_req(capability)).await?;
        }
        Ok(())
    }

    /// Sends `PASS` then `NICK`.
    pub async fn login(&self, user: &str, token: &str) -> TransportResult<()> {
        self.write_frame(&command::pass(token)).await?;
        self.write_frame(&command::nick(user)).await
    }

    pub async fn join(&self, channel: &str) -> TransportResult<()> {
        self.write_frame(&command::join(channel)).await
    }

    pub async fn close(&self) -> TransportResult<()> {
        self.writer.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{self, ScriptedDialer};
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_read_splits_frames_and_answers_ping() {
        let (source, sink, mut remote) = memory::pipe();
        let mut conn = Connection::new(Box::new(source), Box::new(sink));

        remote.push("PING :tmi.twitch.tv\r\n:tmi.twitch.tv 001 bot :Welcome\r\n");
        remote.push(":tmi.twitch.tv NOTICE * :second\r\n");

        assert_eq!(conn.read_line().await.unwrap(), ":tmi.twitch.tv 001 bot :Welcome");
        assert_eq!(remote.next_written().await.as_deref(), Some("PONG :tmi.twitch.tv\r\n"));
        assert_eq!(conn.read_line().await.unwrap(), ":tmi.twitch.tv NOTICE * :second");
    }

    #[tokio::test]
    async fn test_read_fails_when_peer_closes() {
        let (source, sink, remote) = memory::pipe();
        let mut conn = Connection::new(Box::new(source), Box::new(sink));
        drop(remote);

        let err = conn.read_line().await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed { .. }));
    }

    #[tokio::test]
    async fn test_session_setup_frames() {
        let (source, sink, mut remote) = memory::pipe();
        let conn = Connection::new(Box::new(source), Box::new(sink));

        assert_ok!(
            conn.request_caps(&[command::CAP_TAGS, command::CAP_COMMANDS])
                .await
        );
        assert_ok!(conn.login("kestrel", "oauth:token").await);
        assert_ok!(conn.join("Streamer").await);

        let expected = [
            "CAP REQ :twitch.tv/tags\r\n",
            "CAP REQ :twitch.tv/commands\r\n",
            "PASS oauth:token\r\n",
            "NICK kestrel\r\n",
            "JOIN #streamer\r\n",
        ];
        for frame in expected {
            assert_eq!(remote.next_written().await.as_deref(), Some(frame));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dial_timeout() {
        let dialer = ScriptedDialer::new();
        dialer.push_hang();

        let err = dial(&dialer, Duration::from_secs(10)).await.err().unwrap();
        assert!(matches!(err, TransportError::DialTimeout(d) if d == Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_dial_failure_propagates() {
        let dialer = ScriptedDialer::new();
        dialer.push_failure();

        let err = dial(&dialer, Duration::from_secs(10)).await.err().unwrap();
        assert!(matches!(err, TransportError::DialFailed { .. }));
    }
}
