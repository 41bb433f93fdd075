//! Serverless gateway adapter.
//!
//! # Responsibilities
//! - Lower a gateway event (`requestContext.http` shape) into the canonical
//!   request and invoke the pipeline
//! - Reject malformed JSON bodies with 400 before the pipeline runs
//! - Denormalize the canonical response into the gateway's
//!   `{statusCode, headers, body, isBase64Encoded}` shape
//!
//! # Design Decisions
//! - An unrecognized HTTP method cannot match any route, so it resolves to
//!   404; the bearer gate still answers first
//! - Binary response bodies are base64-encoded with the flag set; the
//!   gateway decodes them on its side
//! - The full event rides along as passthrough so handlers can reach fields
//!   the canonical request does not model

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::pipeline::Api;
use crate::dispatch::request::{parse_cookie_header, ApiRequest, RequestBody};
use crate::dispatch::response::{ApiResponse, ResponseBody};
use crate::routing::Method;

/// The inbound gateway event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEvent {
    pub request_context: RequestContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorizer: Option<Value>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string_parameters: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub http: HttpContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpContext {
    pub method: String,
    pub path: String,
}

/// The outbound gateway response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl Api {
    /// Dispatch one gateway event through the pipeline.
    pub async fn gateway_event(&self, event: GatewayEvent) -> GatewayResponse {
        let Ok(method) = event.request_context.http.method.parse::<Method>() else {
            // No route can carry this method; the auth gate still answers
            // before the 404 does.
            let denied = self.authorize_header(lookup_header(&event.headers, "authorization"));
            return early_response(denied.unwrap_or_else(|| ApiResponse::error(404, "Not Found")));
        };

        let content_type = lookup_header(&event.headers, "content-type").unwrap_or("");
        let is_json = content_type.to_ascii_lowercase().contains("application/json");
        let body = match &event.body {
            None => RequestBody::None,
            Some(raw) if is_json => match serde_json::from_str::<Value>(raw) {
                Ok(value) => RequestBody::Json(value),
                Err(error) => {
                    tracing::warn!(error = %error, "gateway event body is not valid JSON");
                    return early_response(ApiResponse::error(400, "Bad Request"));
                }
            },
            Some(raw) => RequestBody::Text(raw.clone()),
        };

        let passthrough = serde_json::to_value(&event).ok();
        let mut request = ApiRequest::new(method, &event.request_context.http.path);
        request.store_headers(event.headers);
        if let Some(cookie) = request.header("cookie") {
            request.cookies = parse_cookie_header(cookie);
        }
        request.query = event.query_string_parameters.unwrap_or_default();
        request.body = body;
        request.authorizer = event.authorizer;
        request.passthrough = passthrough;

        into_gateway_response(self.handle(request).await)
    }
}

/// Finishes a response produced before the pipeline could run.
fn early_response(mut response: ApiResponse) -> GatewayResponse {
    response.ensure_content_type();
    into_gateway_response(response)
}

fn into_gateway_response(response: ApiResponse) -> GatewayResponse {
    let (body, is_base64) = match response.body {
        ResponseBody::Empty => (String::new(), response.is_base64),
        ResponseBody::Text(text) => (text, response.is_base64),
        ResponseBody::Json(value) => (value.to_string(), response.is_base64),
        ResponseBody::Bytes(bytes) => (STANDARD.encode(bytes), true),
    };
    GatewayResponse {
        status_code: response.status,
        headers: response.headers,
        body,
        is_base64_encoded: is_base64,
    }
}

fn lookup_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::pipeline::ApiOptions;
    use crate::routing::RouteRegistry;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn event(method: &str, path: &str) -> GatewayEvent {
        GatewayEvent {
            request_context: RequestContext {
                http: HttpContext {
                    method: method.to_string(),
                    path: path.to_string(),
                },
            },
            authorizer: None,
            headers: HashMap::new(),
            body: None,
            query_string_parameters: None,
        }
    }

    fn api(options: ApiOptions, build: impl FnOnce(&mut RouteRegistry)) -> Api {
        let mut routes = RouteRegistry::new();
        build(&mut routes);
        Api::new(routes, options).unwrap()
    }

    #[tokio::test]
    async fn json_body_round_trips_through_an_echo_route() {
        let api = api(ApiOptions::default(), |r| {
            r.add("/echo", Method::Post, |req: ApiRequest| async move {
                let body = req.body.as_json().cloned().unwrap_or(Value::Null);
                Ok(ApiResponse::json(body).with_status(201))
            })
            .unwrap();
        });

        let mut event = event("POST", "/echo");
        event
            .headers
            .insert("content-type".to_string(), "application/json".to_string());
        event.body = Some(r#"{"a":1}"#.to_string());

        let res = api.gateway_event(event).await;
        assert_eq!(res.status_code, 201);
        assert_eq!(res.body, r#"{"a":1}"#);
        assert!(!res.is_base64_encoded);
    }

    #[tokio::test]
    async fn malformed_json_body_is_400_before_the_pipeline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let api = api(ApiOptions::default(), |r| {
            r.add("/echo", Method::Post, move |_req| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(ApiResponse::ok())
                }
            })
            .unwrap();
        });

        let mut event = event("POST", "/echo");
        event
            .headers
            .insert("content-type".to_string(), "application/json".to_string());
        event.body = Some("{not json".to_string());

        let res = api.gateway_event(event).await;
        assert_eq!(res.status_code, 400);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_json_content_type_keeps_the_body_raw() {
        let api = api(ApiOptions::default(), |r| {
            r.add("/ingest", Method::Post, |req: ApiRequest| async move {
                Ok(ApiResponse::text(
                    req.body.as_text().unwrap_or("").to_string(),
                ))
            })
            .unwrap();
        });

        let mut event = event("POST", "/ingest");
        event
            .headers
            .insert("content-type".to_string(), "text/csv".to_string());
        event.body = Some("a,b,c".to_string());

        let res = api.gateway_event(event).await;
        assert_eq!(res.body, "a,b,c");
    }

    #[tokio::test]
    async fn byte_bodies_come_back_base64_encoded() {
        let api = api(ApiOptions::default(), |r| {
            r.add("/blob", Method::Get, |_req| async {
                Ok(ApiResponse::bytes(vec![0xde, 0xad, 0xbe, 0xef]))
            })
            .unwrap();
        });

        let res = api.gateway_event(event("GET", "/blob")).await;
        assert!(res.is_base64_encoded);
        assert_eq!(STANDARD.decode(res.body).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[tokio::test]
    async fn unknown_method_is_404_but_auth_still_answers_first() {
        let api = api(
            ApiOptions {
                bearer_token: Some("secret".to_string()),
                ..ApiOptions::default()
            },
            |r| {
                r.add("/ping", Method::Get, |_req| async { Ok(ApiResponse::ok()) })
                    .unwrap();
            },
        );

        let res = api.gateway_event(event("BREW", "/ping")).await;
        assert_eq!(res.status_code, 401);

        let mut authed = event("BREW", "/ping");
        authed
            .headers
            .insert("Authorization".to_string(), "Bearer secret".to_string());
        let res = api.gateway_event(authed).await;
        assert_eq!(res.status_code, 404);
    }

    #[tokio::test]
    async fn query_cookies_and_claims_reach_the_handler() {
        let api = api(ApiOptions::default(), |r| {
            r.add("/who", Method::Get, |req: ApiRequest| async move {
                Ok(ApiResponse::json(json!({
                    "q": req.query.get("q"),
                    "session": req.cookies.get("session"),
                    "claims": req.authorizer,
                })))
            })
            .unwrap();
        });

        let mut event = event("GET", "/who");
        event
            .headers
            .insert("Cookie".to_string(), "session=s1".to_string());
        event.query_string_parameters = Some(HashMap::from([("q".to_string(), "rust".to_string())]));
        event.authorizer = Some(json!({"sub": "user-1"}));

        let res = api.gateway_event(event).await;
        let body: Value = serde_json::from_str(&res.body).unwrap();
        assert_eq!(body["q"], "rust");
        assert_eq!(body["session"], "s1");
        assert_eq!(body["claims"]["sub"], "user-1");
    }
}
