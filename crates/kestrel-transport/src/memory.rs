//! In-memory transport.
//!
//! Pairs of channels stand in for a socket so that sessions can be driven
//! without a network. [`ScriptedDialer`] replays a queue of dial outcomes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::connection::{BoxedSink, BoxedSource, Dialer, FrameSink, FrameSource};
use crate::error::{TransportError, TransportResult};

const ENDPOINT: &str = "memory://";

/// Inbound half backed by a channel.
#[derive(Debug)]
pub struct MemorySource {
    rx: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn next_frame(&mut self) -> TransportResult<Option<String>> {
        Ok(self.rx.recv().await)
    }
}

/// Outbound half backed by a channel.
#[derive(Debug)]
pub struct MemorySink {
    tx: Option<mpsc::UnboundedSender<String>>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send_frame(&mut self, frame: String) -> TransportResult<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| TransportError::SendFailed("sink closed".into()))?;

        tx.send(frame)
            .map_err(|_| TransportError::SendFailed("peer dropped".into()))
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.tx = None;
        Ok(())
    }
}

/// The far end of an in-memory connection.
#[derive(Debug)]
pub struct Remote {
    inbound: Option<mpsc::UnboundedSender<String>>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl Remote {
    /// Delivers a frame to the connection.
    pub fn push(&self, frame: impl Into<String>) {
        if let Some(tx) = &self.inbound {
            let _ = tx.send(frame.into());
        }
    }

    /// Ends the inbound stream, as if the server hung up.
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }

    /// Waits for the next frame the connection wrote. Returns `None` once the
    /// connection has closed its sink.
    pub async fn next_written(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    /// Returns a frame the connection already wrote, without waiting.
    pub fn try_written(&mut self) -> Option<String> {
        self.outbound.try_recv().ok()
    }
}

/// Creates a connected source, sink, and remote end.
pub fn pipe() -> (MemorySource, MemorySink, Remote) {
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();

    (
        MemorySource { rx: in_rx },
        MemorySink { tx: Some(out_tx) },
        Remote {
            inbound: Some(in_tx),
            outbound: out_rx,
        },
    )
}

enum Outcome {
    Connect(MemorySource, MemorySink),
    Fail,
    Hang,
}

/// A dialer that replays queued outcomes in order.
///
/// Once the script runs out every dial fails.
#[derive(Default)]
pub struct ScriptedDialer {
    script: Mutex<VecDeque<Outcome>>,
    attempts: AtomicUsize,
}

impl ScriptedDialer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful dial and returns its remote end.
    pub fn push_connection(&self) -> Remote {
        let (source, sink, remote) = pipe();
        self.script.lock().push_back(Outcome::Connect(source, sink));
        remote
    }

    /// Queues a failed dial.
    pub fn push_failure(&self) {
        self.script.lock().push_back(Outcome::Fail);
    }

    /// Queues a dial that never completes.
    pub fn push_hang(&self) {
        self.script.lock().push_back(Outcome::Hang);
    }

    /// Number of dial attempts so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    fn endpoint(&self) -> &str {
        ENDPOINT
    }

    async fn dial(&self) -> TransportResult<(BoxedSource, BoxedSink)> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let outcome = self.script.lock().pop_front();
        match outcome {
            Some(Outcome::Connect(source, sink)) => Ok((Box::new(source), Box::new(sink))),
            Some(Outcome::Hang) => std::future::pending().await,
            Some(Outcome::Fail) | None => Err(TransportError::DialFailed {
                url: ENDPOINT.to_string(),
                reason: "scripted failure".to_string(),
            }),
        }
    }
}
