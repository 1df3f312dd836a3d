//! WebSocket dialer.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{info, trace};

use crate::command::DEFAULT_URL;
use crate::connection::{BoxedSink, BoxedSource, Dialer, FrameSink, FrameSource};
use crate::error::{TransportError, TransportResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials a chat server over WebSocket.
#[derive(Debug, Clone)]
pub struct WsDialer {
    url: String,
}

impl WsDialer {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for WsDialer {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

#[async_trait]
impl Dialer for WsDialer {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn dial(&self) -> TransportResult<(BoxedSource, BoxedSink)> {
        let (ws_stream, _response) =
            connect_async(&self.url)
                .await
                .map_err(|e| TransportError::DialFailed {
                    url: self.url.clone(),
                    reason: format!("WebSocket connection failed: {e}"),
                })?;

        info!(url = %self.url, "WebSocket connected");

        let (ws_tx, ws_rx) = ws_stream.split();
        Ok((Box::new(WsSource(ws_rx)), Box::new(WsSink(ws_tx))))
    }
}

struct WsSource(SplitStream<WsStream>);

#[async_trait]
impl FrameSource for WsSource {
    async fn next_frame(&mut self) -> TransportResult<Option<String>> {
        loop {
            match self.0.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.to_string())),
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(String::from_utf8_lossy(&data).into_owned()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                    trace!("Skipping control frame");
                }
                Some(Err(e)) => return Err(TransportError::ReadFailed(e.to_string())),
            }
        }
    }
}

struct WsSink(SplitSink<WsStream, Message>);

#[async_trait]
impl FrameSink for WsSink {
    async fn send_frame(&mut self, frame: String) -> TransportResult<()> {
        self.0
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.0
            .close()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}
