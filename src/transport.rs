//! WebSocket Transport Layer
//!
//! Single responsibility: open a WebSocket to a URL and hand back inbound messages.
//! No knowledge of retries, identifiers or reporting.
//!
//! The supervisor only sees the [`Connector`] and [`Connection`] traits, so tests can
//! drive the state machine without a network.

use std::fmt;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio_tungstenite::{
    connect_async_with_config,
    tungstenite::{
        handshake::client::generate_key, http::Request, protocol::Message, Error as WsError,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::debug;

use crate::error::TransportError;

/// A payload received on an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Text(String),
    Binary(Vec<u8>),
}

impl InboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
        }
    }
}

impl fmt::Display for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Binary(data) => write!(f, "<{} bytes of binary data>", data.len()),
        }
    }
}

/// Opens connections.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Connection;

    /// Returns only once the handshake has completed.
    async fn connect(&self, url: &str) -> Result<Self::Connection, TransportError>;
}

/// One open transport session.
#[async_trait]
pub trait Connection: Send {
    /// Wait for the next payload.
    ///
    /// Every way a connection can end is an error, including a clean close by the
    /// server, so the caller never has to tell "closed" apart from "failed".
    async fn next_message(&mut self) -> Result<InboundMessage, TransportError>;

    /// Best-effort close. Errors are ignored; the connection is going away anyway.
    async fn close(&mut self);
}

/// Connects with tokio-tungstenite. `wss://` goes through the platform TLS stack.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    type Connection = WsConnection;

    async fn connect(&self, url: &str) -> Result<WsConnection, TransportError> {
        debug!(url = %url, "Connecting to WebSocket");

        let request = Request::builder()
            .uri(url)
            .header("Host", extract_host(url))
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Sec-WebSocket-Version", "13")
            .header("Sec-WebSocket-Key", generate_key())
            .body(())
            .map_err(|e| TransportError::connect(url, format!("invalid request: {}", e)))?;

        let (stream, _) = connect_async_with_config(request, None, false)
            .await
            .map_err(|e| TransportError::connect(url, e))?;

        debug!(url = %url, "WebSocket connected");
        Ok(WsConnection { stream })
    }
}

/// An open tokio-tungstenite stream.
///
/// The stream is kept whole rather than split so that pongs queued by tungstenite
/// are flushed while we read.
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn next_message(&mut self) -> Result<InboundMessage, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(InboundMessage::Text(text)),
                Some(Ok(Message::Binary(data))) => return Ok(InboundMessage::Binary(data)),
                Some(Ok(Message::Close(frame))) => {
                    let reason = match frame {
                        Some(frame) if frame.reason.is_empty() => format!("code {}", frame.code),
                        Some(frame) => format!("code {}: {}", frame.code, frame.reason),
                        None => "no close frame".to_string(),
                    };
                    return Err(TransportError::closed(reason));
                }
                Some(Ok(Message::Ping(_))) => {
                    // Pong is handled automatically by tungstenite
                    continue;
                }
                Some(Ok(_)) => continue, // Pong, raw frames
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                    return Err(TransportError::closed("connection closed"))
                }
                Some(Err(e)) => return Err(TransportError::ReadFailure(e.to_string())),
                None => return Err(TransportError::closed("stream ended")),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Ignoring error while closing WebSocket");
        }
    }
}

/// Extract host from URL for Host header
fn extract_host(url: &str) -> &str {
    url.split("//")
        .nth(1)
        .and_then(|s| s.split('/').next())
        .unwrap_or("localhost")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_host() {
        assert_eq!(extract_host("ws://lnbits-2:5000/api/v1/ws/abc"), "lnbits-2:5000");
        assert_eq!(extract_host("wss://example.com/path"), "example.com");
        assert_eq!(extract_host("invalid"), "localhost");
    }

    #[test]
    fn test_inbound_message_kind() {
        assert_eq!(InboundMessage::Text("hi".into()).kind(), "text");
        assert_eq!(InboundMessage::Binary(vec![]).kind(), "binary");
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_is_connect_failure() {
        // Bind and drop to get a port nothing is listening on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("ws://{}/api/v1/ws/abc", addr);
        let err = WsConnector.connect(&url).await.err().expect("connect should fail");
        assert!(
            matches!(err, TransportError::ConnectFailure { url: ref u, .. } if *u == url),
            "unexpected error: {err:?}"
        );
    }
}
