//! Classification of decoded frames.
//!
//! Parsing happens in two stages: the outer envelope is read and classified by
//! its `type` field, and only a result's payload is parsed a second time,
//! because the service JSON-encodes `{text, session_id}` into the `data`
//! string.

use linker_core::ProtocolVersion;
use serde_json::{Map, Value};

use crate::decoder::StreamFrame;

/// A classified frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Final answer. Ends the stream.
    Result {
        text: String,
        session_id: Option<String>,
    },
    /// Service-side failure. Ends the stream.
    Error { message: String },
    /// Status text for the loading indicator. May repeat.
    ProgressUpdate { status: String },
    /// Anything else; logged and skipped.
    Unrecognized { raw: String },
}

impl StreamEvent {
    /// Result and Error end the logical stream even if the transport stays open.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result { .. } | Self::Error { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Result { .. } => "result",
            Self::Error { .. } => "error",
            Self::ProgressUpdate { .. } => "progress-update",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }
}

/// Classify one frame under the given protocol revision.
pub fn parse_event(frame: &StreamFrame, protocol: ProtocolVersion) -> StreamEvent {
    let raw = frame.raw.as_str();

    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => return plain_text(raw, protocol),
    };

    match value {
        Value::Object(map) => match map.get("type") {
            Some(Value::String(kind)) => parse_typed(kind, &map, raw, protocol),
            Some(_) => unrecognized(raw),
            None if protocol.accepts_untyped() => progress(raw),
            None => unrecognized(raw),
        },
        Value::String(text) if protocol.accepts_untyped() => progress(&text),
        _ => unrecognized(raw),
    }
}

fn parse_typed(
    kind: &str,
    map: &Map<String, Value>,
    raw: &str,
    protocol: ProtocolVersion,
) -> StreamEvent {
    match kind {
        "result" => parse_result(map, protocol),
        "error" => StreamEvent::Error {
            message: error_message(map, protocol).unwrap_or_else(|| "Unknown error".into()),
        },
        "progress-update" => match progress_status(map, protocol) {
            Some(status) => StreamEvent::ProgressUpdate { status },
            None => unrecognized(raw),
        },
        _ => unrecognized(raw),
    }
}

/// A `result` frame always ends the stream; missing text reads as empty.
fn parse_result(map: &Map<String, Value>, protocol: ProtocolVersion) -> StreamEvent {
    let mut text = None;
    let mut session_id = None;

    if protocol.accepts_enveloped() {
        if let Some(data) = map.get("data") {
            (text, session_id) = inner_result(data);
        }
    }

    if protocol.accepts_flat() {
        if text.is_none() {
            text = str_field(map, &["text"]);
        }
        if session_id.is_none() {
            session_id = str_field(map, &["session_id", "sessionId"]);
        }
    }

    StreamEvent::Result {
        text: text.unwrap_or_default(),
        session_id,
    }
}

/// Second parse pass over a result's `data`. A string that is not a JSON
/// object is taken as the result text itself.
fn inner_result(data: &Value) -> (Option<String>, Option<String>) {
    match data {
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Object(inner)) => (
                str_field(&inner, &["text"]),
                str_field(&inner, &["session_id", "sessionId"]),
            ),
            _ => (Some(encoded.clone()), None),
        },
        Value::Object(inner) => (
            str_field(inner, &["text"]),
            str_field(inner, &["session_id", "sessionId"]),
        ),
        _ => (None, None),
    }
}

fn error_message(map: &Map<String, Value>, protocol: ProtocolVersion) -> Option<String> {
    if protocol.accepts_enveloped() {
        match map.get("data") {
            Some(Value::String(message)) => return Some(message.clone()),
            Some(Value::Object(inner)) => {
                if let Some(message) = str_field(inner, &["message", "error"]) {
                    return Some(message);
                }
            }
            _ => {}
        }
    }
    if protocol.accepts_flat() {
        return str_field(map, &["message", "error", "text"]);
    }
    None
}

fn progress_status(map: &Map<String, Value>, protocol: ProtocolVersion) -> Option<String> {
    if protocol.accepts_enveloped() {
        if let Some(status) = str_field(map, &["data"]) {
            return Some(status);
        }
    }
    if protocol.accepts_flat() {
        return str_field(map, &["text", "status"]);
    }
    None
}

fn str_field(map: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| map.get(*name).and_then(Value::as_str))
        .map(str::to_string)
}

fn plain_text(raw: &str, protocol: ProtocolVersion) -> StreamEvent {
    if protocol.accepts_plain_text() && !raw.trim().is_empty() {
        progress(raw.trim())
    } else {
        unrecognized(raw)
    }
}

fn progress(status: &str) -> StreamEvent {
    StreamEvent::ProgressUpdate {
        status: status.to_string(),
    }
}

fn unrecognized(raw: &str) -> StreamEvent {
    StreamEvent::Unrecognized {
        raw: raw.to_string(),
    }
}
