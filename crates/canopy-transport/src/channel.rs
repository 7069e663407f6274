//! The underlying bidirectional channel.
//!
//! The link state machine only sees the [`BidiChannel`] / [`Connector`] pair;
//! the production binding speaks WebSocket with one JSON frame per message.
//! Swapping the channel implementation (or injecting a scripted one in tests)
//! never touches the state machine.

use async_trait::async_trait;
use canopy_core::flags::Endpoint;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::warn;

use crate::wire::{ClientToServer, ServerToClient};

/// Errors surfaced by the transport. Not retried internally — the owner of
/// the link decides what a failure means.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("channel closed")]
    Closed,

    #[error("send failed: {0}")]
    Send(String),

    #[error("receive failed: {0}")]
    Receive(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// One open bidirectional channel.
#[async_trait]
pub trait BidiChannel: Send {
    async fn send(&mut self, message: ClientToServer) -> Result<(), TransportError>;

    /// Next inbound frame; `Ok(None)` on orderly close by the peer.
    async fn recv(&mut self) -> Result<Option<ServerToClient>, TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Performs the handshake for one channel.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn BidiChannel>, TransportError>;
}

/// WebSocket connector: `ws://{host}:{port}{path}`.
pub struct WsConnector {
    path: String,
}

impl WsConnector {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new("/bidi")
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn BidiChannel>, TransportError> {
        let url = format!("ws://{}:{}{}", endpoint.host, endpoint.port, self.path);
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|err| TransportError::Handshake(err.to_string()))?;
        Ok(Box::new(WsChannel { stream }))
    }
}

/// WebSocket channel carrying one JSON message per text frame.
pub struct WsChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl BidiChannel for WsChannel {
    async fn send(&mut self, message: ClientToServer) -> Result<(), TransportError> {
        let json =
            serde_json::to_string(&message).map_err(|err| TransportError::Send(err.to_string()))?;
        self.stream
            .send(Message::Text(json))
            .await
            .map_err(|err| TransportError::Send(err.to_string()))
    }

    async fn recv(&mut self) -> Result<Option<ServerToClient>, TransportError> {
        while let Some(frame) = self.stream.next().await {
            let frame = frame.map_err(|err| TransportError::Receive(err.to_string()))?;
            match frame {
                Message::Text(text) => match serde_json::from_str(&text) {
                    Ok(message) => return Ok(Some(message)),
                    Err(err) => warn!("dropping unparseable frame: {err}"),
                },
                Message::Binary(bytes) => match serde_json::from_slice(&bytes) {
                    Ok(message) => return Ok(Some(message)),
                    Err(err) => warn!("dropping unparseable binary frame: {err}"),
                },
                Message::Close(_) => return Ok(None),
                // Pings are answered by the protocol layer on the next flush.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self.stream.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(err) => Err(TransportError::Send(err.to_string())),
        }
    }
}
