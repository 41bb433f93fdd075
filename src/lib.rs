//! Request/event dispatch toolkit for network services.

pub mod config;
pub mod dispatch;
pub mod observability;
pub mod realtime;
pub mod routing;
pub mod security;

pub use config::ServiceConfig;
pub use dispatch::{Api, ApiOptions, ApiRequest, ApiResponse, Flow};
pub use realtime::{EventDispatcher, EventRegistry, WsTransport};
pub use routing::{Method, RouteRegistry};

/// Boxed error type carried through handler and middleware results.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
