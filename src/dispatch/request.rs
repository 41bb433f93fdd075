//! Canonical request representation.
//!
//! # Responsibilities
//! - Provide the one request shape every adapter lowers into
//! - Canonicalize ingested data: normalized path, lowercase header keys
//! - Parse `Cookie` headers and query strings into maps
//!
//! # Design Decisions
//! - The body is a three-way sum, absent / parsed JSON / raw text, so
//!   handlers never have to re-guess what an empty string meant
//! - Header keys are lowercased once at ingestion; lookups lowercase the
//!   probe name so callers can ask for "Content-Type" and still hit
//! - Duplicate query keys keep the last value seen

use std::collections::HashMap;

use serde_json::Value;

use crate::routing::{normalize_path, Method};

/// Request body after adapter ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body was present on the inbound request.
    None,
    /// The body parsed as JSON.
    Json(Value),
    /// A non-JSON body, kept verbatim.
    Text(String),
}

impl RequestBody {
    pub fn is_none(&self) -> bool {
        matches!(self, RequestBody::None)
    }

    /// The parsed JSON body, if there is one.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RequestBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// The canonical request handed to middleware and handlers.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Normalized path: single slashes, no trailing slash except root.
    pub path: String,
    /// Header map with lowercase keys.
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    pub body: RequestBody,
    /// Path parameters bound at route resolution.
    pub params: HashMap<String, String>,
    /// Claims attached by the caller's authorizer, when present.
    pub authorizer: Option<Value>,
    /// The original inbound event, for handlers that need raw access.
    pub passthrough: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: normalize_path(path),
            headers: HashMap::new(),
            query: HashMap::new(),
            cookies: HashMap::new(),
            body: RequestBody::None,
            params: HashMap::new(),
            authorizer: None,
            passthrough: None,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Ingest headers, lowercasing every key.
    pub(crate) fn store_headers<I>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in headers {
            self.headers.insert(name.to_ascii_lowercase(), value);
        }
    }
}

/// Parse a `Cookie` header value into name/value pairs.
///
/// Segments without `=` and empty names are skipped; values are kept raw.
pub(crate) fn parse_cookie_header(raw: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for segment in raw.split(';') {
        let Some((name, value)) = segment.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        cookies.insert(name.to_string(), value.trim().to_string());
    }
    cookies
}

/// Parse a raw query string (no leading `?`) into a map.
pub(crate) fn parse_query(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_normalizes_the_path() {
        let req = ApiRequest::new(Method::Get, "//users//42/");
        assert_eq!(req.path, "/users/42");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut req = ApiRequest::new(Method::Get, "/");
        req.store_headers([("Content-Type".to_string(), "text/plain".to_string())]);

        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.header("CONTENT-TYPE"), Some("text/plain"));
        assert!(req.headers.contains_key("content-type"));
    }

    #[test]
    fn cookie_header_parsing_skips_malformed_segments() {
        let cookies = parse_cookie_header("session=abc123; theme=dark; ; bare; =nameless");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies.get("session").map(String::as_str), Some("abc123"));
        assert_eq!(cookies.get("theme").map(String::as_str), Some("dark"));
    }

    #[test]
    fn query_parsing_decodes_and_keeps_last_duplicate() {
        let query = parse_query("name=a%20b&mode=fast&mode=slow");
        assert_eq!(query.get("name").map(String::as_str), Some("a b"));
        assert_eq!(query.get("mode").map(String::as_str), Some("slow"));
    }

    #[test]
    fn body_accessors() {
        assert!(RequestBody::None.is_none());
        let json = RequestBody::Json(serde_json::json!({"ok": true}));
        assert!(json.as_json().is_some());
        assert!(json.as_text().is_none());
        let text = RequestBody::Text("plain".to_string());
        assert_eq!(text.as_text(), Some("plain"));
    }
}
