use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:8090".to_string());

    println!("Connecting to {url}...");
    let (mut socket, _) = tokio_tungstenite::connect_async(&url).await?;

    // 1. The transport greets every connection with its id
    if let Some(Ok(Message::Text(frame))) = socket.next().await {
        println!("Handshake: {frame}");
    }

    // 2. Liveness probe; any frame containing "ping" gets a pong
    socket.send(Message::text("ping")).await?;
    if let Some(Ok(Message::Text(frame))) = socket.next().await {
        println!("Liveness: {frame}");
    }

    // 3. A real event; the demo service echoes it back as "echo.reply"
    socket
        .send(Message::text(
            r#"{"type":"echo","payload":{"hello":"switchboard"}}"#,
        ))
        .await?;
    if let Some(Ok(Message::Text(frame))) = socket.next().await {
        println!("Echo reply: {frame}");
    }

    socket.close(None).await?;
    Ok(())
}
