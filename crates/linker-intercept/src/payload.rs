//! Message forwarded for every captured response.

use linker_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{url, timestamp, fullResponse, credentials}` as sent to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturePayload {
    pub url: String,
    /// Capture time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "fullResponse")]
    pub full_response: Value,
    /// Items extracted from the response's `data` array.
    #[serde(default)]
    pub credentials: Vec<Value>,
}

impl CapturePayload {
    /// Parse a captured body. Fails when the body is not JSON.
    pub fn from_body(url: &str, body: &[u8]) -> Result<Self> {
        let full_response: Value = serde_json::from_slice(body)?;
        let credentials = match full_response.get("data") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        Ok(Self {
            url: url.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            full_response,
            credentials,
        })
    }

    pub fn item_count(&self) -> usize {
        self.credentials.len()
    }
}
