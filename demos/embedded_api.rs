use std::sync::Arc;

use serde_json::json;
use switchboard::config::HttpConfig;
use switchboard::dispatch::{self, ApiOptions, ApiRequest};
use switchboard::routing::Method;
use switchboard::{Api, ApiResponse, RouteRegistry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let mut routes = RouteRegistry::new();
    routes.add("/hello/:name", Method::Get, |req: ApiRequest| async move {
        let name = req.params.get("name").cloned().unwrap_or_default();
        Ok(ApiResponse::json(json!({ "hello": name })))
    })?;

    let api = Arc::new(Api::new(routes, ApiOptions::default())?);
    let config = HttpConfig {
        bind_address: "127.0.0.1:8080".to_string(),
        ..HttpConfig::default()
    };

    println!("Serving on http://{}", config.bind_address);
    dispatch::serve(api, &config).await?;
    Ok(())
}
