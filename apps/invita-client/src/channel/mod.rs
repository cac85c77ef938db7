//! Real-time reaction synchronization channel.
//!
//! A spawned task owns the socket and walks the transport fallback order;
//! the [`ReactionChannel`] handle is what a view holds. Events flow out on
//! an mpsc stream, outbound frames flow in on another, and dropping the
//! handle tears the task down — no reconnection outlives the view that
//! mounted it.

pub mod connection;

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time;
use tokio_tungstenite::tungstenite::Message;

use invita_common::id::{prefix, prefixed_ulid};
use invita_common::{ClientFrame, ReactionKind, ServerFrame};

use crate::error::ClientError;

pub use connection::{
    ChannelConfig, ChannelState, Connector, GatewayStream, Transport, TungsteniteConnector,
};

/// Buffered events between the channel task and the owning view.
const EVENT_BUFFER: usize = 256;
/// Buffered outbound frames.
const OUTBOUND_BUFFER: usize = 64;

/// What the channel reports to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A connection attempt succeeded.
    Open { transport: Transport },
    /// Authoritative aggregate count pushed by the server.
    Reaction {
        invitation_id: String,
        kind: ReactionKind,
        count: u64,
    },
    /// The open connection dropped; the task moves on to the next
    /// transport (if any remain).
    Closed { transport: Transport },
    /// Every transport failed. Terminal: live updates stop, the view
    /// degrades to last-fetched state.
    Exhausted { attempts: u32 },
}

/// Handle to a live (or connecting) channel. Dropping it closes the socket
/// and cancels any further attempts.
pub struct ReactionChannel {
    id: String,
    events: mpsc::Receiver<ChannelEvent>,
    outbound: mpsc::Sender<ClientFrame>,
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<ChannelState>,
}

impl ReactionChannel {
    /// Spawn the channel task and start connecting.
    pub fn connect(config: ChannelConfig, connector: Arc<dyn Connector>) -> Self {
        let id = prefixed_ulid(prefix::CHANNEL);
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ChannelState::Idle);

        tokio::spawn(run_channel(
            id.clone(),
            config,
            connector,
            outbound_rx,
            event_tx,
            state_tx,
            shutdown_rx,
        ));

        Self {
            id,
            events: event_rx,
            outbound: outbound_tx,
            shutdown: shutdown_tx,
            state: state_rx,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Next channel event; `None` once the task has exited.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    /// Queue an outbound frame (e.g. `REACT_TO_IMAGE`).
    pub async fn send(&self, frame: ClientFrame) -> Result<(), ClientError> {
        self.outbound
            .send(frame)
            .await
            .map_err(|_| ClientError::ChannelClosed)
    }

    /// Close the connection and stop all further attempts.
    pub fn close(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Drop for ReactionChannel {
    fn drop(&mut self) {
        self.close();
    }
}

// ---------------------------------------------------------------------------
// Channel task
// ---------------------------------------------------------------------------

enum OpenEnd {
    /// The owner asked for teardown; do not try further transports.
    Shutdown,
    /// The connection dropped on its own; fall back.
    Dropped,
}

async fn run_channel(
    id: String,
    config: ChannelConfig,
    connector: Arc<dyn Connector>,
    mut outbound: mpsc::Receiver<ClientFrame>,
    events: mpsc::Sender<ChannelEvent>,
    state: watch::Sender<ChannelState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attempts: u32 = 0;

    for transport in config.transports.iter().copied() {
        // Fixed delay between attempts, but never before the first one.
        if attempts > 0 {
            tokio::select! {
                _ = time::sleep(config.fallback_delay) => {}
                _ = shutdown.changed() => {
                    let _ = state.send(ChannelState::Closed);
                    return;
                }
            }
        }
        attempts += 1;

        let url = config.url_for(transport);
        let _ = state.send(ChannelState::Connecting);
        tracing::info!(channel = %id, %transport, attempt = attempts, "connecting");

        let connected = tokio::select! {
            result = connector.connect(&url) => result,
            _ = shutdown.changed() => {
                let _ = state.send(ChannelState::Closed);
                return;
            }
        };

        let stream = match connected {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(channel = %id, %transport, %e, "connection attempt failed");
                continue;
            }
        };

        let _ = state.send(ChannelState::Open);
        tracing::info!(channel = %id, %transport, "channel open");
        if events.send(ChannelEvent::Open { transport }).await.is_err() {
            return; // Owner is gone.
        }

        let end = run_open(&id, stream, &mut outbound, &events, &mut shutdown).await;
        let _ = state.send(ChannelState::Closed);

        match end {
            OpenEnd::Shutdown => return,
            OpenEnd::Dropped => {
                if events
                    .send(ChannelEvent::Closed { transport })
                    .await
                    .is_err()
                {
                    return;
                }
                // Fall through to the next transport.
            }
        }
    }

    tracing::warn!(channel = %id, attempts, "all transports exhausted");
    let _ = state.send(ChannelState::Failed);
    let _ = events.send(ChannelEvent::Exhausted { attempts }).await;
}

/// Pump one open connection until it drops or the owner shuts us down.
async fn run_open(
    id: &str,
    stream: connection::GatewayStream,
    outbound: &mut mpsc::Receiver<ClientFrame>,
    events: &mpsc::Sender<ChannelEvent>,
    shutdown: &mut watch::Receiver<bool>,
) -> OpenEnd {
    let (mut ws_tx, mut ws_rx) = stream.split();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerFrame>(&text) {
                            Ok(ServerFrame::ReactionUpdate {
                                invitation_id,
                                reaction_type,
                                count,
                            }) => {
                                let event = ChannelEvent::Reaction {
                                    invitation_id,
                                    kind: reaction_type,
                                    count,
                                };
                                if events.send(event).await.is_err() {
                                    return OpenEnd::Shutdown;
                                }
                            }
                            // A bad frame must not kill the channel.
                            Err(e) => {
                                tracing::debug!(channel = %id, ?e, "unparseable frame skipped");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => return OpenEnd::Dropped,
                    Some(Err(e)) => {
                        tracing::debug!(channel = %id, ?e, "channel read error");
                        return OpenEnd::Dropped;
                    }
                    _ => continue,
                }
            }

            frame = outbound.recv() => {
                match frame {
                    Some(frame) => {
                        let json = match serde_json::to_string(&frame) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!(channel = %id, ?e, "unserializable outbound frame");
                                continue;
                            }
                        };
                        if ws_tx.send(Message::Text(json.into())).await.is_err() {
                            return OpenEnd::Dropped;
                        }
                    }
                    // Handle dropped without a shutdown signal.
                    None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        return OpenEnd::Shutdown;
                    }
                }
            }

            _ = shutdown.changed() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                return OpenEnd::Shutdown;
            }
        }
    }
}
