//! Channel transports, connection state, and the connector seam.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::ClientError;

/// A connection scheme, tried in the order configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// TLS WebSocket (`wss://`).
    Wss,
    /// Plaintext WebSocket (`ws://`), the fallback.
    Ws,
}

impl Transport {
    pub fn scheme(&self) -> &'static str {
        match self {
            Transport::Wss => "wss",
            Transport::Ws => "ws",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Lifecycle of the channel's single active connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Connecting,
    Open,
    Closed,
    /// Every configured transport has been exhausted; no more attempts.
    Failed,
}

/// How the channel connects to the real-time endpoint.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Host (and optional port) of the logical endpoint; every transport
    /// targets the same host.
    pub host: String,
    /// Bearer credential passed as a connection parameter.
    pub token: String,
    /// Transports in preference order: secure first.
    pub transports: Vec<Transport>,
    /// Fixed delay before falling back to the next transport.
    pub fallback_delay: Duration,
}

impl ChannelConfig {
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            transports: vec![Transport::Wss, Transport::Ws],
            fallback_delay: Duration::from_millis(1000),
        }
    }

    pub fn url_for(&self, transport: Transport) -> String {
        format!("{}://{}/?token={}", transport.scheme(), self.host, self.token)
    }
}

/// The stream type every connector yields.
pub type GatewayStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Seam between the fallback state machine and the socket library, so tests
/// can count or fail connection attempts without opening real sockets.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<GatewayStream, ClientError>;
}

/// Production connector backed by tokio-tungstenite.
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<GatewayStream, ClientError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ClientError::Channel(e.to_string()))?;
        Ok(stream)
    }
}
