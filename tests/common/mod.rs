//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use switchboard::config::{HttpConfig, RealtimeConfig};
use switchboard::dispatch::{build_router, Api};
use switchboard::realtime::WsTransport;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

#[allow(dead_code)]
pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serve an API on an ephemeral port and return its address.
#[allow(dead_code)]
pub async fn spawn_api(api: Api) -> SocketAddr {
    spawn_api_with(api, HttpConfig::default()).await
}

/// Serve an API on an ephemeral port with explicit HTTP settings.
#[allow(dead_code)]
pub async fn spawn_api_with(api: Api, config: HttpConfig) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(Arc::new(api), &config);
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Bind a realtime transport on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_transport(max_connections: usize) -> Arc<WsTransport> {
    let config = RealtimeConfig {
        host: "127.0.0.1".to_string(),
        port: free_port(),
        max_connections,
    };
    Arc::new(WsTransport::bind(&config).await.unwrap())
}

/// Grab an ephemeral port by binding and immediately releasing it.
#[allow(dead_code)]
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("no free port available")
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}

/// Connect a WebSocket client to a transport.
#[allow(dead_code)]
pub async fn connect_ws(transport: &WsTransport) -> WsClient {
    let url = format!("ws://{}", transport.local_addr());
    let (socket, _) = tokio_tungstenite::connect_async(url)
        .await
        .expect("websocket connect failed");
    socket
}

/// Read the next text frame as JSON, failing after a short timeout.
#[allow(dead_code)]
pub async fn next_json(socket: &mut WsClient) -> Value {
    use futures_util::StreamExt;
    let frame = tokio::time::timeout(Duration::from_secs(2), socket.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("connection closed")
        .expect("read failed");
    match frame {
        Message::Text(text) => serde_json::from_str(text.as_str()).expect("frame was not JSON"),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

/// Assert that no text frame arrives within the window.
#[allow(dead_code)]
pub async fn expect_silence(socket: &mut WsClient, window: Duration) {
    use futures_util::StreamExt;
    if let Ok(Some(Ok(frame))) = tokio::time::timeout(window, socket.next()).await {
        panic!("expected silence, got {frame:?}");
    }
}
