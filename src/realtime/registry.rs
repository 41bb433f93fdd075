//! Event handler registration.
//!
//! Registries are plain collections of `(type, handler)` bindings that can
//! be built independently, module by module, and concatenated with
//! [`EventRegistry::merge`] before being handed to the dispatcher.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::realtime::envelope::Envelope;
use crate::BoxError;

/// A boxed event handler.
pub type EventHandler = Arc<dyn Fn(Envelope) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Box an async closure into an [`EventHandler`].
pub fn event_handler<F, Fut>(f: F) -> EventHandler
where
    F: Fn(Envelope) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Arc::new(move |envelope| -> BoxFuture<'static, Result<(), BoxError>> { Box::pin(f(envelope)) })
}

/// One `(type, handler)` binding.
pub struct EventBinding {
    pub kind: String,
    pub handler: EventHandler,
}

/// An ordered collection of event bindings.
#[derive(Default)]
pub struct EventRegistry {
    bindings: Vec<EventBinding>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler to an event type. Multiple handlers may share one
    /// type; they keep their binding order.
    pub fn on<F, Fut>(mut self, kind: &str, f: F) -> Self
    where
        F: Fn(Envelope) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.bindings.push(EventBinding {
            kind: kind.to_string(),
            handler: event_handler(f),
        });
        self
    }

    /// Concatenate registries, preserving order within and across each.
    pub fn merge(registries: impl IntoIterator<Item = EventRegistry>) -> Self {
        let mut merged = Self::new();
        for registry in registries {
            merged.bindings.extend(registry.bindings);
        }
        merged
    }

    pub fn bindings(&self) -> &[EventBinding] {
        &self.bindings
    }

    pub(crate) fn into_bindings(self) -> Vec<EventBinding> {
        self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
