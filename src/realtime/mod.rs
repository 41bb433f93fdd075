//! Real-time event layer: envelope codec, WebSocket transport, and the
//! type-keyed event dispatcher.
//!
//! # Data Flow
//! ```text
//! peer frame -> WsTransport -> envelope::decode -> EventDispatcher
//!                                                      |-> handler fan-out
//! EventDispatcher::broadcast -> envelope::encode -> WsTransport -> peers
//! ```
//!
//! The transport never interprets envelope types beyond its own liveness
//! fast path; everything type-keyed happens in the dispatcher.

pub mod dispatcher;
pub mod envelope;
pub mod registry;
pub mod transport;

pub use dispatcher::EventDispatcher;
pub use envelope::{decode, encode, CodecError, Envelope};
pub use registry::{event_handler, EventBinding, EventHandler, EventRegistry};
pub use transport::{ConnectionId, TransportError, WsTransport};
