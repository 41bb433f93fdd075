//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files;
//! every field has a default so a minimal config stays minimal.

use serde::{Deserialize, Serialize};

/// Root configuration for the dispatch service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP adapter settings (bind address, body limit, timeout).
    pub http: HttpConfig,

    /// Realtime transport settings (bind host/port, connection cap).
    pub realtime: RealtimeConfig,

    /// Bearer auth settings.
    pub auth: AuthConfig,

    /// CORS headers; absent means no CORS headers are emitted.
    pub cors: Option<CorsConfig>,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Development switches. Keep these off in production.
    pub dev: DevConfig,
}

/// HTTP adapter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body size in bytes.
    pub max_body_size: usize,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 2 * 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Realtime transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Host to bind the WebSocket listener on.
    pub host: String,

    /// Port to bind the WebSocket listener on. Must be non-zero.
    pub port: u16,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            max_connections: 1024,
        }
    }
}

/// Bearer auth configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// When set, every dispatched request must present this bearer token.
    pub bearer_token: Option<String>,
}

/// CORS header configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// `Access-Control-Allow-Origin` value.
    pub origin: String,

    /// `Access-Control-Allow-Methods` value.
    pub methods: String,

    /// `Access-Control-Allow-Headers` value.
    pub headers: String,

    /// Emit `Access-Control-Allow-Credentials: true`.
    pub credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origin: "*".to_string(),
            methods: "GET,POST,PUT,PATCH,DELETE,HEAD,OPTIONS".to_string(),
            headers: "Content-Type, Authorization".to_string(),
            credentials: false,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when RUST_LOG is unset.
    pub log_level: String,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Address the metrics exporter listens on.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "switchboard=info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Development switches.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DevConfig {
    /// Include failure messages in 500 response bodies.
    pub expose_errors: bool,
}
