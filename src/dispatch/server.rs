//! Raw HTTP adapter.
//!
//! # Responsibilities
//! - Accept plain HTTP requests on a TCP listener and lower them into the
//!   canonical request
//! - Apply CORS headers and answer `OPTIONS` preflights with 204 before
//!   anything else runs
//! - Read bodies only for POST/PUT/PATCH, bounded by the configured size
//! - Derive a best-effort authorizer by decoding bearer JWT claims
//! - Denormalize the canonical response onto the wire
//!
//! # Design Decisions
//! - One catch-all axum route; all routing happens in the dispatch core so
//!   both adapters resolve identically
//! - Request timeout and tracing ride as tower layers, outside the adapter
//! - A base64-flagged text body is decoded before writing; if the decode
//!   fails the raw text is written and a warning logged

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, Method as HttpMethod, StatusCode};
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;
use crate::dispatch::pipeline::Api;
use crate::dispatch::request::{parse_cookie_header, parse_query, ApiRequest, RequestBody};
use crate::dispatch::response::{ApiResponse, ResponseBody};
use crate::routing::Method;
use crate::security::claims::decode_bearer_claims;
use crate::BoxError;

#[derive(Clone)]
struct ServerState {
    api: Arc<Api>,
    max_body_size: usize,
}

/// Build the axum router that funnels every path into the dispatch core.
pub fn build_router(api: Arc<Api>, config: &HttpConfig) -> Router {
    let state = ServerState {
        api,
        max_body_size: config.max_body_size,
    };
    Router::new()
        .route("/", any(handle_http))
        .route("/{*path}", any(handle_http))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .with_state(state)
}

/// Bind and serve until a shutdown signal arrives.
///
/// Bind failures are fatal; the error propagates to the caller instead of
/// being retried.
pub async fn serve(api: Arc<Api>, config: &HttpConfig) -> Result<(), BoxError> {
    let listener = match tokio::net::TcpListener::bind(&config.bind_address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(address = %config.bind_address, error = %error, "failed to bind HTTP listener");
            return Err(error.into());
        }
    };
    tracing::info!(address = %listener.local_addr()?, "HTTP dispatcher listening");

    let router = build_router(api, config);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

async fn handle_http(State(state): State<ServerState>, request: Request) -> Response {
    let cors = cors_headers(&state.api);

    // Preflights are answered before auth, resolution, anything.
    if request.method() == HttpMethod::OPTIONS {
        return write_response(ApiResponse::ok().with_status(204), &cors);
    }

    let (parts, body) = request.into_parts();

    let Ok(method) = parts.method.as_str().parse::<Method>() else {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok());
        let denied = state.api.authorize_header(auth_header);
        let mut response = denied.unwrap_or_else(|| ApiResponse::error(404, "Not Found"));
        response.ensure_content_type();
        return write_response(response, &cors);
    };

    let mut api_request = ApiRequest::new(method, parts.uri.path());
    api_request.store_headers(
        parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            }),
    );
    api_request.query = parse_query(parts.uri.query().unwrap_or(""));
    if let Some(cookie) = api_request.header("cookie") {
        api_request.cookies = parse_cookie_header(cookie);
    }
    api_request.authorizer = decode_bearer_claims(api_request.header("authorization"));

    if method.has_request_body() {
        let bytes = match axum::body::to_bytes(body, state.max_body_size).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(%method, error = %error, "request body exceeded limit or failed to read");
                let mut response = ApiResponse::error(413, "Payload Too Large");
                response.ensure_content_type();
                return write_response(response, &cors);
            }
        };
        if !bytes.is_empty() {
            let raw = String::from_utf8_lossy(&bytes).into_owned();
            let is_json = api_request
                .header("content-type")
                .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
                .unwrap_or(false);
            api_request.body = if is_json {
                match serde_json::from_str(&raw) {
                    Ok(value) => RequestBody::Json(value),
                    Err(error) => {
                        tracing::warn!(error = %error, "request body is not valid JSON");
                        let mut response = ApiResponse::error(400, "Bad Request");
                        response.ensure_content_type();
                        return write_response(response, &cors);
                    }
                }
            } else {
                RequestBody::Text(raw)
            };
        }
    }

    let response = state.api.handle(api_request).await;
    write_response(response, &cors)
}

/// The fixed CORS header set, built once per request from the API options.
fn cors_headers(api: &Api) -> Vec<(&'static str, String)> {
    let Some(cors) = &api.options.cors else {
        return Vec::new();
    };
    let mut headers = vec![
        ("access-control-allow-origin", cors.origin.clone()),
        ("access-control-allow-methods", cors.methods.clone()),
        ("access-control-allow-headers", cors.headers.clone()),
        ("access-control-max-age", "86400".to_string()),
    ];
    if cors.credentials {
        headers.push(("access-control-allow-credentials", "true".to_string()));
    }
    headers
}

fn write_response(response: ApiResponse, cors: &[(&'static str, String)]) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or_else(|_| {
        tracing::warn!(status = response.status, "handler produced an invalid status code");
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let body = match response.body {
        ResponseBody::Empty => Body::empty(),
        ResponseBody::Json(value) => Body::from(value.to_string()),
        ResponseBody::Bytes(bytes) => Body::from(bytes),
        ResponseBody::Text(text) if response.is_base64 => match STANDARD.decode(&text) {
            Ok(bytes) => Body::from(bytes),
            Err(error) => {
                tracing::warn!(error = %error, "base64 body failed to decode, writing raw text");
                Body::from(text)
            }
        },
        ResponseBody::Text(text) => Body::from(text),
    };

    let mut http_response = Response::new(body);
    *http_response.status_mut() = status;
    let header_map = http_response.headers_mut();
    let all = response
        .headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .chain(cors.iter().map(|(name, value)| (*name, value.as_str())));
    for (name, value) in all {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                header_map.insert(name, value);
            }
            _ => tracing::warn!(header = name, "dropping invalid response header"),
        }
    }
    http_response
}
