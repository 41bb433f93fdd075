//! WebSocket transport.
//!
//! # Responsibilities
//! - Bind the realtime listener and accept WebSocket connections, bounded
//!   by a connection semaphore
//! - Send the handshake frame, answer ping probes, and forward decoded
//!   envelopes to the dispatcher's inbound channel
//! - Broadcast frames to a snapshot of open connections, isolating each
//!   send failure
//!
//! # Data Flow
//! ```text
//! TcpListener -> accept loop -> per-connection task
//!                                  |- writer task  <- peer sender queue
//!                                  |- read loop -> ping fast path
//!                                  |              -> envelope::decode -> inbound channel
//!                                  |              -> error frame on decode failure
//! broadcast(frame) -> peer sender queues (snapshot, per-send isolation)
//! ```
//!
//! # Design Decisions
//! - A bind failure is fatal to the caller; a transport that cannot bind
//!   has no degraded mode worth running in
//! - Each connection owns an outbound queue drained by its writer task, so
//!   broadcast never awaits a slow peer
//! - Connection close and read errors are logged and end only that
//!   connection; the listener and other peers are unaffected

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::config::RealtimeConfig;
use crate::observability::metrics;
use crate::realtime::envelope::{self, Envelope};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("realtime port must be within 1..=65535, got {0}")]
    InvalidPort(u16),
    #[error("failed to bind realtime listener on {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier for one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

struct Peer {
    tx: mpsc::UnboundedSender<Message>,
}

/// WebSocket listener plus the registry of currently open connections.
pub struct WsTransport {
    local_addr: SocketAddr,
    peers: Arc<DashMap<ConnectionId, Peer>>,
    inbound: Mutex<Option<mpsc::UnboundedReceiver<Envelope>>>,
    shutdown: watch::Sender<bool>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl WsTransport {
    /// Validate the configured port, bind, and start accepting.
    pub async fn bind(config: &RealtimeConfig) -> Result<Self, TransportError> {
        if config.port == 0 {
            return Err(TransportError::InvalidPort(config.port));
        }

        let address = format!("{}:{}", config.host, config.port);
        let listener = match TcpListener::bind(&address).await {
            Ok(listener) => listener,
            Err(source) => {
                tracing::error!(%address, error = %source, "failed to bind realtime listener");
                return Err(TransportError::Bind { address, source });
            }
        };
        let local_addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind {
                address: address.clone(),
                source,
            })?;
        tracing::info!(address = %local_addr, max_connections = config.max_connections, "realtime transport listening");

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let peers: Arc<DashMap<ConnectionId, Peer>> = Arc::new(DashMap::new());
        let limiter = Arc::new(Semaphore::new(config.max_connections));

        let accept_task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&peers),
            inbound_tx,
            limiter,
            shutdown_rx,
        ));

        Ok(Self {
            local_addr,
            peers,
            inbound: Mutex::new(Some(inbound_rx)),
            shutdown: shutdown_tx,
            accept_task: Mutex::new(Some(accept_task)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of currently open connections.
    pub fn connection_count(&self) -> usize {
        self.peers.len()
    }

    /// Send a frame to every open connection. Send failures are logged per
    /// connection and never abort the remaining sends.
    pub fn broadcast(&self, frame: &str) {
        let mut delivered = 0usize;
        for peer in self.peers.iter() {
            if peer.tx.is_closed() {
                continue;
            }
            if let Err(error) = peer.tx.send(Message::text(frame.to_string())) {
                tracing::warn!(connection = %peer.key(), error = %error, "broadcast send failed");
                continue;
            }
            delivered += 1;
        }
        tracing::debug!(connections = delivered, "broadcast delivered");
    }

    /// Hand the inbound envelope stream to its single consumer.
    pub(crate) fn take_inbound(&self) -> Option<mpsc::UnboundedReceiver<Envelope>> {
        self.inbound
            .lock()
            .expect("transport inbound lock poisoned")
            .take()
    }

    /// Stop accepting and close the listener. Idempotent.
    pub async fn close(&self) {
        let task = self
            .accept_task
            .lock()
            .expect("transport task lock poisoned")
            .take();
        if let Some(task) = task {
            let _ = self.shutdown.send(true);
            if let Err(error) = task.await {
                tracing::warn!(error = %error, "accept loop did not join cleanly");
            }
            tracing::info!("realtime transport closed");
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    peers: Arc<DashMap<ConnectionId, Peer>>,
    inbound: mpsc::UnboundedSender<Envelope>,
    limiter: Arc<Semaphore>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        // Take a connection slot before accepting so the backlog, not this
        // process, absorbs bursts past the limit.
        let permit = tokio::select! {
            permit = Arc::clone(&limiter).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return,
            },
            _ = shutdown.changed() => return,
        };

        let (stream, remote) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(error) => {
                    tracing::warn!(error = %error, "accept failed");
                    continue;
                }
            },
            _ = shutdown.changed() => return,
        };

        let id = ConnectionId::next();
        tracing::debug!(connection = %id, %remote, "connection accepted");
        tokio::spawn(handle_connection(
            stream,
            id,
            Arc::clone(&peers),
            inbound.clone(),
            permit,
        ));
    }
}

async fn handle_connection(
    stream: TcpStream,
    id: ConnectionId,
    peers: Arc<DashMap<ConnectionId, Peer>>,
    inbound: mpsc::UnboundedSender<Envelope>,
    permit: OwnedSemaphorePermit,
) {
    // Held for the life of the connection; releasing it frees the slot.
    let _permit = permit;

    let socket = match tokio_tungstenite::accept_async(stream).await {
        Ok(socket) => socket,
        Err(error) => {
            tracing::warn!(connection = %id, error = %error, "websocket handshake failed");
            return;
        }
    };
    let (mut sink, mut source) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    peers.insert(id, Peer { tx: tx.clone() });
    metrics::connection_opened();

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(error) = sink.send(message).await {
                tracing::warn!(error = %error, "websocket write failed");
                break;
            }
        }
    });

    // Handshake first, so the peer learns its connection id.
    match envelope::encode("connected", &json!({ "connectionId": id.to_string() })) {
        Ok(frame) => {
            let _ = tx.send(Message::text(frame));
        }
        Err(error) => tracing::warn!(connection = %id, error = %error, "failed to encode handshake"),
    }

    while let Some(frame) = source.next().await {
        match frame {
            Ok(Message::Text(text)) => handle_frame(id, text.as_str(), &tx, &inbound),
            Ok(Message::Close(_)) => {
                tracing::debug!(connection = %id, "connection closed by peer");
                break;
            }
            // Protocol-level ping/pong is answered by tungstenite itself.
            Ok(_) => {}
            Err(error) => {
                tracing::debug!(connection = %id, error = %error, "connection errored");
                break;
            }
        }
    }

    peers.remove(&id);
    metrics::connection_closed();
    drop(tx);
    if let Err(error) = writer.await {
        tracing::warn!(connection = %id, error = %error, "writer task did not join cleanly");
    }
    tracing::debug!(connection = %id, "connection finished");
}

fn handle_frame(
    id: ConnectionId,
    raw: &str,
    tx: &mpsc::UnboundedSender<Message>,
    inbound: &mpsc::UnboundedSender<Envelope>,
) {
    // Liveness fast path: any frame carrying the ping token gets a pong
    // before envelope decoding is even attempted.
    if raw.contains("ping") {
        if let Ok(frame) = envelope::encode("pong", &Value::Null) {
            let _ = tx.send(Message::text(frame));
        }
        return;
    }

    match envelope::decode(raw) {
        Some(envelope) => {
            if inbound.send(envelope).is_err() {
                tracing::debug!(connection = %id, "inbound channel closed, dropping frame");
            }
        }
        None => {
            // Only the offending connection hears about its bad frame.
            match envelope::encode("error", &json!({ "message": "malformed message" })) {
                Ok(frame) => {
                    let _ = tx.send(Message::text(frame));
                }
                Err(error) => tracing::warn!(error = %error, "failed to encode error frame"),
            }
        }
    }
}

/// Grab an ephemeral port by binding and immediately releasing it.
#[cfg(test)]
pub(crate) fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("no free port available")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn port_zero_is_rejected_before_binding() {
        let config = RealtimeConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_connections: 4,
        };
        let outcome = WsTransport::bind(&config).await;
        assert!(matches!(outcome, Err(TransportError::InvalidPort(0))));
    }

    #[test]
    fn connection_ids_are_unique_and_display_stably() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("conn-"));
    }
}
