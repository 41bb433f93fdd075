//! Gateway adapter integration tests: event-shaped dispatch end to end.

use std::sync::Arc;

use serde_json::{json, Value};
use switchboard::dispatch::{
    middleware, Api, ApiOptions, ApiRequest, ApiResponse, Flow, GatewayEvent,
};
use switchboard::routing::{Method, RouteError, RouteRegistry};

mod common;

fn event_from(value: Value) -> GatewayEvent {
    serde_json::from_value(value).expect("event shape should deserialize")
}

#[tokio::test]
async fn test_json_events_echo_through_a_route() {
    let mut routes = RouteRegistry::new();
    routes
        .add("/echo", Method::Post, |req: ApiRequest| async move {
            let body = req.body.as_json().cloned().unwrap_or(Value::Null);
            Ok(ApiResponse::json(body).with_status(201))
        })
        .unwrap();
    let api = Api::new(routes, ApiOptions::default()).unwrap();

    let event = event_from(json!({
        "requestContext": {"http": {"method": "POST", "path": "/echo"}},
        "headers": {"content-type": "application/json"},
        "body": "{\"a\":1}",
    }));
    let res = api.gateway_event(event).await;

    assert_eq!(res.status_code, 201);
    assert_eq!(res.body, "{\"a\":1}");
    assert!(!res.is_base64_encoded);
    assert_eq!(
        res.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
}

#[tokio::test]
async fn test_both_adapters_resolve_identically() {
    let mut routes = RouteRegistry::new();
    routes
        .add("/users/:id", Method::Get, |req: ApiRequest| async move {
            Ok(ApiResponse::json(json!({"id": req.params.get("id")})))
        })
        .unwrap();
    let api = Arc::new(Api::new(routes, ApiOptions::default()).unwrap());

    let event = event_from(json!({
        "requestContext": {"http": {"method": "GET", "path": "/users/7"}},
    }));
    let gateway_res = api.gateway_event(event).await;

    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = switchboard::dispatch::build_router(
            Arc::clone(&api),
            &switchboard::config::HttpConfig::default(),
        );
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        addr
    };
    let http_res = common::client()
        .get(format!("http://{addr}/users/7"))
        .send()
        .await
        .unwrap();

    assert_eq!(gateway_res.status_code, http_res.status().as_u16());
    let http_body: Value = http_res.json().await.unwrap();
    let gateway_body: Value = serde_json::from_str(&gateway_res.body).unwrap();
    assert_eq!(gateway_body, http_body);
}

#[tokio::test]
async fn test_merged_registries_dispatch_in_order() {
    let mut users = RouteRegistry::new();
    users
        .add("/users/:id", Method::Get, |req: ApiRequest| async move {
            Ok(ApiResponse::json(json!({"module": "users", "id": req.params.get("id")})))
        })
        .unwrap();

    let mut admin = RouteRegistry::new();
    admin
        .add("/admin/stats", Method::Get, |_req| async {
            Ok(ApiResponse::json(json!({"module": "admin"})))
        })
        .unwrap();

    let api = Api::new(RouteRegistry::merge([users, admin]), ApiOptions::default()).unwrap();

    let res = api
        .gateway_event(event_from(json!({
            "requestContext": {"http": {"method": "GET", "path": "/users/3"}},
        })))
        .await;
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["module"], "users");

    let res = api
        .gateway_event(event_from(json!({
            "requestContext": {"http": {"method": "GET", "path": "/admin/stats"}},
        })))
        .await;
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["module"], "admin");
}

#[tokio::test]
async fn test_route_scoped_middleware_runs_through_the_gateway() {
    let mut routes = RouteRegistry::new();
    routes
        .add_with_middleware(
            "/tagged",
            Method::Get,
            |req: ApiRequest| async move {
                Ok(ApiResponse::json(json!({"tag": req.header("x-tag")})))
            },
            vec![middleware(|mut req: ApiRequest| async move {
                req.headers.insert("x-tag".to_string(), "stamped".to_string());
                Ok(Flow::Continue(req))
            })],
        )
        .unwrap();
    let api = Api::new(routes, ApiOptions::default()).unwrap();

    let res = api
        .gateway_event(event_from(json!({
            "requestContext": {"http": {"method": "GET", "path": "/tagged"}},
        })))
        .await;
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["tag"], "stamped");
}

#[tokio::test]
async fn test_event_paths_are_normalized_before_resolution() {
    let mut routes = RouteRegistry::new();
    routes
        .add("/users/:id", Method::Get, |req: ApiRequest| async move {
            Ok(ApiResponse::json(json!({"id": req.params.get("id")})))
        })
        .unwrap();
    let api = Api::new(routes, ApiOptions::default()).unwrap();

    let res = api
        .gateway_event(event_from(json!({
            "requestContext": {"http": {"method": "GET", "path": "//users//7/"}},
        })))
        .await;
    assert_eq!(res.status_code, 200);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["id"], "7");
}

#[tokio::test]
async fn test_wildcard_routes_capture_the_remainder() {
    let mut routes = RouteRegistry::new();
    routes
        .add("/files/*", Method::Get, |req: ApiRequest| async move {
            Ok(ApiResponse::json(json!({"rest": req.params.get("0")})))
        })
        .unwrap();
    let api = Api::new(routes, ApiOptions::default()).unwrap();

    let res = api
        .gateway_event(event_from(json!({
            "requestContext": {"http": {"method": "GET", "path": "/files/reports/2025/q1.csv"}},
        })))
        .await;
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["rest"], "reports/2025/q1.csv");
}

#[tokio::test]
async fn test_duplicate_registrations_fail_before_dispatch() {
    let mut routes = RouteRegistry::new();
    routes
        .add("/dup", Method::Get, |_req| async { Ok(ApiResponse::ok()) })
        .unwrap();
    routes
        .add("/dup", ["GET", "POST"], |_req| async { Ok(ApiResponse::ok()) })
        .unwrap();

    let err = Api::new(routes, ApiOptions::default()).unwrap_err();
    assert!(matches!(err, RouteError::DuplicateRoute { .. }));
}

#[test]
fn test_gateway_response_serializes_with_wire_field_names() {
    let response = switchboard::dispatch::GatewayResponse {
        status_code: 200,
        headers: Default::default(),
        body: "{}".to_string(),
        is_base64_encoded: false,
    };
    let value = serde_json::to_value(&response).unwrap();
    assert!(value.get("statusCode").is_some());
    assert!(value.get("isBase64Encoded").is_some());
    assert!(value.get("body").is_some());
}
