//! Event dispatch with per-handler failure isolation.
//!
//! # Responsibilities
//! - Consume decoded envelopes from the transport's inbound stream
//! - Fan each envelope out to every handler registered for its type
//! - Isolate handler failures: log them with their index, never let one
//!   failure touch sibling handlers or the pump itself
//! - Encode and broadcast outbound events through the transport
//!
//! # Design Decisions
//! - The transport handle is injected at construction; the dispatcher owns
//!   the subscription lifecycle explicitly
//! - Handlers for one envelope are started in registration order and joined
//!   together; completion order is unspecified
//! - The handler map is snapshotted under a read lock that is released
//!   before any handler runs, so registration cannot deadlock dispatch

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::realtime::envelope::{self, Envelope};
use crate::realtime::registry::{EventHandler, EventRegistry};
use crate::realtime::transport::WsTransport;

type HandlerMap = HashMap<String, Vec<EventHandler>>;

/// Routes inbound envelopes to registered handlers and publishes outbound
/// events.
pub struct EventDispatcher {
    transport: Arc<WsTransport>,
    handlers: Arc<RwLock<HandlerMap>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl EventDispatcher {
    pub fn new(transport: Arc<WsTransport>) -> Self {
        Self {
            transport,
            handlers: Arc::new(RwLock::new(HashMap::new())),
            pump: Mutex::new(None),
        }
    }

    /// Register every binding in the registry. Bindings with an empty type
    /// are logged and skipped; one bad binding never blocks the rest.
    ///
    /// Returns the number of bindings actually registered.
    pub fn register_events(&self, registry: EventRegistry) -> usize {
        let mut handlers = self
            .handlers
            .write()
            .expect("dispatcher handler lock poisoned");
        let mut registered = 0;
        for binding in registry.into_bindings() {
            if binding.kind.trim().is_empty() {
                tracing::warn!("skipping event binding with an empty type");
                continue;
            }
            handlers.entry(binding.kind).or_default().push(binding.handler);
            registered += 1;
        }
        registered
    }

    /// Attach to the transport's inbound stream and start pumping.
    ///
    /// The stream has exactly one consumer; calling this twice, or after
    /// another dispatcher consumed the stream, warns and does nothing.
    pub fn start(&self) {
        let mut pump = self.pump.lock().expect("dispatcher pump lock poisoned");
        if pump.is_some() {
            tracing::warn!("event dispatcher already started");
            return;
        }
        let Some(mut inbound) = self.transport.take_inbound() else {
            tracing::warn!("transport inbound stream already consumed");
            return;
        };

        let handlers = Arc::clone(&self.handlers);
        *pump = Some(tokio::spawn(async move {
            while let Some(message) = inbound.recv().await {
                dispatch_message(&handlers, message).await;
            }
            tracing::debug!("inbound stream ended, dispatch pump exiting");
        }));
    }

    /// Encode and broadcast an event to every open connection.
    ///
    /// Encode failures are logged, never returned; event publication is
    /// fire-and-forget by contract.
    pub fn broadcast<P>(&self, kind: &str, payload: &P)
    where
        P: Serialize + ?Sized,
    {
        match envelope::encode(kind, payload) {
            Ok(frame) => self.transport.broadcast(&frame),
            Err(error) => tracing::warn!(%kind, error = %error, "failed to encode broadcast event"),
        }
    }

    /// Stop the pump and clear the handler map. Idempotent.
    pub async fn close(&self) {
        let pump = self
            .pump
            .lock()
            .expect("dispatcher pump lock poisoned")
            .take();
        if let Some(pump) = pump {
            pump.abort();
            let _ = pump.await;
        }
        self.handlers
            .write()
            .expect("dispatcher handler lock poisoned")
            .clear();
        tracing::debug!("event dispatcher closed");
    }
}

async fn dispatch_message(handlers: &RwLock<HandlerMap>, message: Envelope) {
    let batch = {
        let guard = handlers.read().expect("dispatcher handler lock poisoned");
        guard.get(&message.kind).cloned()
    };
    let Some(batch) = batch else {
        tracing::warn!(kind = %message.kind, "no handlers registered for event");
        return;
    };

    let kind = message.kind.clone();
    let running: Vec<_> = batch.iter().map(|handler| handler(message.clone())).collect();
    let results = futures_util::future::join_all(running).await;

    let mut failures = 0usize;
    for (index, result) in results.into_iter().enumerate() {
        if let Err(error) = result {
            failures += 1;
            tracing::error!(%kind, index, error = %error, "event handler failed");
        }
    }
    metrics::record_event(&kind, if failures == 0 { "ok" } else { "failed" });
}
