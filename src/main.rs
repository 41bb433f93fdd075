//! Switchboard dispatch service.
//!
//! A request/event dispatch service built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────────┐
//!                     │                    SWITCHBOARD                    │
//!                     │                                                   │
//!   Gateway event ────┼─▶ dispatch::gateway ──┐                           │
//!                     │                       ▼                           │
//!   Raw HTTP ─────────┼─▶ dispatch::server ─▶ pipeline                    │
//!                     │       auth ─▶ resolve ─▶ middleware ─▶ handler    │
//!                     │                       │                           │
//!   Response ◀────────┼───────────────────────┘                           │
//!                     │                                                   │
//!   WS peers ◀───────▶│ realtime::transport ◀──▶ realtime::dispatcher     │
//!                     │       envelope codec + isolated handler fan-out   │
//!                     │                                                   │
//!                     │  ┌─────────┐  ┌──────────┐  ┌───────────────┐     │
//!                     │  │ config  │  │ security │  │ observability │     │
//!                     │  └─────────┘  └──────────┘  └───────────────┘     │
//!                     └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use switchboard::config::{load_config, ServiceConfig};
use switchboard::dispatch::{self, Api, ApiOptions, ApiRequest, ApiResponse, Flow, RequestBody};
use switchboard::realtime::{EventDispatcher, EventRegistry, WsTransport};
use switchboard::routing::{Method, RouteError, RouteRegistry};

#[derive(Parser)]
#[command(name = "switchboard", version, about = "Request/event dispatch service")]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.observability.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("switchboard v0.1.0 starting");
    tracing::info!(
        bind_address = %config.http.bind_address,
        realtime_port = config.realtime.port,
        request_timeout_secs = config.http.request_timeout_secs,
        "Configuration loaded"
    );

    // Metrics exporter
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            switchboard::observability::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Dispatch core
    let api = Arc::new(build_api(&config)?);

    // Realtime layer
    let transport = Arc::new(WsTransport::bind(&config.realtime).await?);
    let dispatcher = Arc::new(EventDispatcher::new(Arc::clone(&transport)));
    let registered = dispatcher.register_events(service_events(Arc::clone(&dispatcher)));
    tracing::info!(events = registered, "event handlers registered");
    dispatcher.start();

    // Serve HTTP until a shutdown signal arrives
    dispatch::serve(api, &config.http).await?;

    dispatcher.close().await;
    transport.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// The service's route set.
fn build_api(config: &ServiceConfig) -> Result<Api, RouteError> {
    let mut routes = RouteRegistry::new();
    routes.add("/health", Method::Get, |_req| async {
        Ok(ApiResponse::json(json!({ "status": "ok" })))
    })?;
    routes.add("/users/:id", Method::Get, |req: ApiRequest| async move {
        let id = req.params.get("id").cloned().unwrap_or_default();
        Ok(ApiResponse::json(json!({ "id": id })))
    })?;
    routes.add("/echo", Method::Post, |req: ApiRequest| async move {
        Ok(match &req.body {
            RequestBody::Json(value) => ApiResponse::json(value.clone()),
            RequestBody::Text(text) => ApiResponse::text(text.clone()),
            RequestBody::None => ApiResponse::ok(),
        })
    })?;

    let mut api = Api::new(routes, ApiOptions::from_config(config))?;
    api.add_middleware(|req| async move {
        tracing::debug!(method = %req.method, path = %req.path, "inbound request");
        Ok(Flow::Continue(req))
    });
    Ok(api)
}

/// The service's event bindings.
fn service_events(dispatcher: Arc<EventDispatcher>) -> EventRegistry {
    EventRegistry::new().on("echo", move |message| {
        let dispatcher = Arc::clone(&dispatcher);
        async move {
            tracing::info!(id = ?message.id, "echo event received");
            dispatcher.broadcast("echo.reply", &message.payload);
            Ok(())
        }
    })
}
