//! Wire envelope codec.
//!
//! # Responsibilities
//! - Encode `(type, payload)` pairs into `{id, type, payload}` JSON frames
//! - Decode raw frames back into envelopes, rejecting anything malformed
//! - Never let a serialization failure cross the codec boundary
//!
//! # Design Decisions
//! - Every encoded frame carries a fresh UUID so replies can be correlated
//! - A payload that fails to serialize produces a well-formed "error"
//!   envelope instead of an error return; peers always receive valid JSON
//! - A missing `payload` field rejects on decode, an explicit `null` is a
//!   valid payload; the two are deliberately not conflated

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

/// The `{id, type, payload}` unit exchanged over the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Value,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("envelope type must be a non-empty string")]
    EmptyType,
}

/// Encode a payload into an envelope frame.
///
/// Fails loudly only on an empty type. A payload that cannot be serialized
/// comes back as an "error" envelope describing the failure.
pub fn encode<P>(kind: &str, payload: &P) -> Result<String, CodecError>
where
    P: Serialize + ?Sized,
{
    if kind.is_empty() {
        return Err(CodecError::EmptyType);
    }

    let payload = match serde_json::to_value(payload) {
        Ok(value) => value,
        Err(error) => return Ok(fallback_frame(&error)),
    };
    let envelope = Envelope {
        id: Some(fresh_id()),
        kind: kind.to_string(),
        payload,
    };
    match serde_json::to_string(&envelope) {
        Ok(frame) => Ok(frame),
        Err(error) => Ok(fallback_frame(&error)),
    }
}

/// Decode a raw frame. Malformed input logs a warning and yields `None`;
/// the caller decides what to do with the peer.
pub fn decode(raw: &str) -> Option<Envelope> {
    if raw.trim().is_empty() {
        tracing::warn!("refusing to decode an empty frame");
        return None;
    }
    match serde_json::from_str::<Envelope>(raw) {
        Ok(envelope) => Some(envelope),
        Err(error) => {
            tracing::warn!(error = %error, "frame failed to decode");
            None
        }
    }
}

fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

fn fallback_frame(error: &serde_json::Error) -> String {
    let description = error.to_string();
    let lowered = description.to_ascii_lowercase();
    let message = if lowered.contains("circular") || lowered.contains("recursion") {
        "circular reference in payload".to_string()
    } else {
        format!("serialization failed: {description}")
    };
    tracing::warn!(error = %description, "payload failed to serialize, emitting error envelope");

    let fallback = Envelope {
        id: Some(fresh_id()),
        kind: "error".to_string(),
        payload: json!({ "message": message }),
    };
    serde_json::to_string(&fallback).unwrap_or_else(|_| {
        r#"{"type":"error","payload":{"message":"serialization failed"}}"#.to_string()
    })
}
