//! Canonical response representation.
//!
//! # Responsibilities
//! - Provide the one response shape every adapter serializes out of
//! - Offer builders for the common handler cases: JSON, text, bytes,
//!   structured errors
//!
//! # Design Decisions
//! - The body is a sum type; adapters decide per variant how to put it on
//!   the wire (gateway base64-encodes bytes, the HTTP server writes them raw)
//! - `is_base64` marks a text body that is already base64; the HTTP server
//!   decodes it before writing, the gateway forwards it with the flag set
//! - Structured error bodies use the `{"statusCode": .., "error": ..}` shape
//!   so callers can branch on them without string matching

use std::collections::HashMap;

use serde_json::{json, Value};

/// Response body after handler execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
}

/// The canonical response produced by handlers and middleware.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: ResponseBody,
    /// Marks a `Text` body whose content is base64-encoded binary.
    pub is_base64: bool,
}

impl Default for ApiResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: ResponseBody::Empty,
            is_base64: false,
        }
    }
}

impl ApiResponse {
    /// Empty 200.
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn json(value: Value) -> Self {
        Self {
            body: ResponseBody::Json(value),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            body: ResponseBody::Text(text.into()),
            ..Self::default()
        }
    }

    pub fn bytes(bytes: Vec<u8>) -> Self {
        Self {
            body: ResponseBody::Bytes(bytes),
            ..Self::default()
        }
    }

    /// Structured error with the canonical `statusCode`/`error` body.
    pub fn error(status: u16, label: &str) -> Self {
        Self {
            status,
            body: ResponseBody::Json(json!({
                "statusCode": status,
                "error": label,
            })),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Mark the text body as base64-encoded binary.
    pub fn with_base64(mut self) -> Self {
        self.is_base64 = true;
        self
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.keys().any(|k| k.eq_ignore_ascii_case(name))
    }

    /// Default the content type to JSON when the handler set none and the
    /// body is non-empty.
    pub(crate) fn ensure_content_type(&mut self) {
        if matches!(self.body, ResponseBody::Empty) || self.has_header("content-type") {
            return;
        }
        self.headers
            .insert("content-type".to_string(), "application/json".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_is_an_empty_200() {
        let res = ApiResponse::ok();
        assert_eq!(res.status, 200);
        assert_eq!(res.body, ResponseBody::Empty);
        assert!(!res.is_base64);
    }

    #[test]
    fn error_builds_the_structured_body() {
        let res = ApiResponse::error(404, "Not Found");
        assert_eq!(res.status, 404);
        assert_eq!(
            res.body,
            ResponseBody::Json(json!({"statusCode": 404, "error": "Not Found"}))
        );
    }

    #[test]
    fn content_type_defaults_to_json_only_when_unset() {
        let mut res = ApiResponse::json(json!({"ok": true}));
        res.ensure_content_type();
        assert_eq!(
            res.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );

        let mut custom = ApiResponse::text("<p>hi</p>").with_header("Content-Type", "text/html");
        custom.ensure_content_type();
        assert!(!custom.headers.contains_key("content-type"));
        assert_eq!(
            custom.headers.get("Content-Type").map(String::as_str),
            Some("text/html")
        );
    }

    #[test]
    fn empty_bodies_get_no_content_type() {
        let mut res = ApiResponse::ok();
        res.ensure_content_type();
        assert!(res.headers.is_empty());
    }

    #[test]
    fn base64_flag_rides_on_text_bodies() {
        let res = ApiResponse::text("aGVsbG8=").with_base64();
        assert!(res.is_base64);
    }
}
