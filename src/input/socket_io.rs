//! Socket.IO client over a WebSocket
//!
//! Owns one live connection to the sensor server and reconnects on its own
//! after any session end. Consumers only see lifecycle and event
//! notifications on a channel.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use super::packet::{EnginePacket, OpenInfo, PacketError, SocketPacket};
use crate::config::ServerConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound on how long a session may stay silent, whatever the server
/// advertises
const MAX_SILENCE: Duration = Duration::from_secs(600);

/// Time without any frame after which the server counts as gone
fn silence_limit(open: &OpenInfo) -> Duration {
    Duration::from_millis(open.ping_interval.saturating_add(open.ping_timeout)).min(MAX_SILENCE)
}

/// Errors that end a transport session
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Protocol error: {0}")]
    Packet(#[from] PacketError),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Connection refused by server: {0}")]
    ConnectRefused(String),

    #[error("Ping timeout")]
    PingTimeout,
}

/// What the transport reports to its consumer
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected { reason: String },
    Event { name: String, data: Value },
}

enum SessionEnd {
    /// Shutdown requested or consumer gone
    Stop,
    /// Connection ended, a reconnect should follow
    Lost(String),
}

/// Socket.IO client with automatic reconnection
pub struct SocketIoClient {
    endpoint: Url,
    namespace: String,
    config: ServerConfig,
}

impl SocketIoClient {
    pub fn new(config: &ServerConfig) -> Result<Self, TransportError> {
        let namespace = if config.namespace.starts_with('/') {
            config.namespace.clone()
        } else {
            format!("/{}", config.namespace)
        };
        Ok(SocketIoClient {
            endpoint: config.socket_url()?,
            namespace,
            config: config.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run the connection loop until shutdown is signalled or the channel
    /// is closed
    pub async fn run(self, tx: mpsc::Sender<TransportEvent>, mut shutdown: watch::Receiver<bool>) {
        log::info!("Socket.IO client started for {}", self.endpoint);
        let mut attempt: u32 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let mut connected = false;
            let end = self.session(&tx, &mut shutdown, &mut connected).await;

            if connected {
                attempt = 0;
            }

            let reason = match end {
                Ok(SessionEnd::Stop) => break,
                Ok(SessionEnd::Lost(reason)) => reason,
                Err(e) => {
                    log::warn!("Socket.IO session error: {}", e);
                    e.to_string()
                }
            };

            if connected
                && tx
                    .send(TransportEvent::Disconnected { reason: reason.clone() })
                    .await
                    .is_err()
            {
                break;
            }

            let delay = self.config.reconnect_delay(attempt);
            attempt = attempt.saturating_add(1);
            log::info!("Reconnecting in {:?} ({})", delay, reason);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {}
            }
        }

        log::info!("Socket.IO client stopped");
    }

    async fn session(
        &self,
        tx: &mpsc::Sender<TransportEvent>,
        shutdown: &mut watch::Receiver<bool>,
        connected: &mut bool,
    ) -> Result<SessionEnd, TransportError> {
        let (mut ws, _response) = tokio::select! {
            result = connect_async(self.endpoint.as_str()) => result?,
            _ = shutdown.changed() => return Ok(SessionEnd::Stop),
        };

        let open = tokio::select! {
            result = Self::read_open(&mut ws) => result?,
            _ = shutdown.changed() => {
                let _ = ws.close(None).await;
                return Ok(SessionEnd::Stop);
            }
        };
        log::debug!("Engine.IO session {} opened", open.sid);

        let connect = SocketPacket::Connect {
            namespace: self.namespace.clone(),
            data: None,
        };
        ws.send(Message::Text(connect.to_frame())).await?;

        let silence = silence_limit(&open);

        loop {
            let next = tokio::select! {
                next = tokio::time::timeout(silence, ws.next()) => next,
                _ = shutdown.changed() => {
                    self.close(&mut ws, *connected).await;
                    return Ok(SessionEnd::Stop);
                }
            };

            let message = match next {
                Err(_) => return Err(TransportError::PingTimeout),
                Ok(None) => return Ok(SessionEnd::Lost("transport close".to_string())),
                Ok(Some(message)) => message?,
            };

            let text = match message {
                Message::Text(text) => text,
                Message::Ping(payload) => {
                    ws.send(Message::Pong(payload)).await?;
                    continue;
                }
                Message::Close(_) => return Ok(SessionEnd::Lost("transport close".to_string())),
                _ => {
                    log::debug!("Ignoring non-text WebSocket frame");
                    continue;
                }
            };

            let packet = match EnginePacket::decode(&text) {
                Ok(packet) => packet,
                Err(e) => {
                    log::warn!("Dropping undecodable Engine.IO frame: {}", e);
                    continue;
                }
            };

            match packet {
                EnginePacket::Ping(data) => {
                    ws.send(Message::Text(EnginePacket::Pong(data).encode())).await?;
                }
                EnginePacket::Close => {
                    return Ok(SessionEnd::Lost("transport close".to_string()));
                }
                EnginePacket::Message(body) => {
                    let packet = match SocketPacket::decode(&body) {
                        Ok(packet) => packet,
                        Err(e) => {
                            log::warn!("Dropping undecodable Socket.IO packet: {}", e);
                            continue;
                        }
                    };
                    if packet.namespace() != self.namespace {
                        continue;
                    }

                    let event = match packet {
                        SocketPacket::Connect { .. } => {
                            *connected = true;
                            log::info!("Connected to {}", self.endpoint);
                            TransportEvent::Connected
                        }
                        SocketPacket::Disconnect { .. } => {
                            return Ok(SessionEnd::Lost("io server disconnect".to_string()));
                        }
                        SocketPacket::ConnectError { message, .. } => {
                            return Err(TransportError::ConnectRefused(message));
                        }
                        SocketPacket::Event { name, data, .. } => TransportEvent::Event { name, data },
                        SocketPacket::Ack { .. } => continue,
                    };

                    if tx.send(event).await.is_err() {
                        log::info!("Channel closed, stopping Socket.IO client");
                        self.close(&mut ws, *connected).await;
                        return Ok(SessionEnd::Stop);
                    }
                }
                EnginePacket::Open(_) | EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {}
            }
        }
    }

    async fn read_open(ws: &mut WsStream) -> Result<OpenInfo, TransportError> {
        while let Some(message) = ws.next().await {
            match message? {
                Message::Text(text) => {
                    return match EnginePacket::decode(&text)? {
                        EnginePacket::Open(info) => Ok(info),
                        other => Err(TransportError::Handshake(format!(
                            "expected open packet, got {:?}",
                            other
                        ))),
                    };
                }
                Message::Close(_) => break,
                _ => continue,
            }
        }
        Err(TransportError::Handshake("connection closed before open packet".to_string()))
    }

    /// Leave the namespace and close the WebSocket
    async fn close(&self, ws: &mut WsStream, connected: bool) {
        if connected {
            let disconnect = SocketPacket::Disconnect {
                namespace: self.namespace.clone(),
            };
            if let Err(e) = ws.send(Message::Text(disconnect.to_frame())).await {
                log::debug!("Failed to send disconnect packet: {}", e);
            }
        }
        if let Err(e) = ws.close(None).await {
            log::debug!("Failed to close WebSocket: {}", e);
        }
    }
}
