//! The singleton "last captured credential set".

use std::sync::Arc;

use linker_core::{domain_of, Result};
use linker_intercept::CapturePayload;
use linker_store::{keys, KvStore, KvStoreExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptedCredentialSet {
    /// Capture time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// URL the response was captured from.
    pub url: String,
    pub raw_response: Value,
    pub domain: String,
    pub credential_count: usize,
}

impl InterceptedCredentialSet {
    pub fn from_payload(payload: CapturePayload) -> Self {
        Self {
            timestamp: payload.timestamp,
            domain: domain_of(&payload.url),
            credential_count: payload.credentials.len(),
            url: payload.url,
            raw_response: payload.full_response,
        }
    }

    /// `{id, name, type}` of every entry in the raw response's `data` array.
    pub fn summaries(&self) -> Vec<CredentialSummary> {
        match self.raw_response.get("data") {
            Some(Value::Array(items)) => items.iter().map(CredentialSummary::from_item).collect(),
            _ => Vec::new(),
        }
    }
}

/// Display row for one captured credential. Secret material is never copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl CredentialSummary {
    fn from_item(item: &Value) -> Self {
        let field = |key: &str| match item.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self {
            id: field("id"),
            name: field("name"),
            kind: field("type"),
        }
    }
}

/// Reads and overwrites the credential slot in a [`KvStore`].
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KvStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Replace the stored set unconditionally.
    pub fn capture(&self, set: &InterceptedCredentialSet) -> Result<()> {
        self.store.set_typed(keys::CREDENTIALS, set)
    }

    pub fn get(&self) -> Result<Option<InterceptedCredentialSet>> {
        self.store.get_typed(keys::CREDENTIALS)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.set(keys::CREDENTIALS, Value::Null)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use linker_store::MemoryStore;
    use serde_json::json;

    pub(crate) fn payload(url: &str, count: usize) -> CapturePayload {
        let data: Vec<Value> = (0..count)
            .map(|i| json!({ "id": format!("cred_{}", i), "name": format!("Cred {}", i), "type": "slackApi", "data": { "token": "secret" } }))
            .collect();
        CapturePayload {
            url: url.to_string(),
            timestamp: 1_736_244_000_000,
            full_response: json!({ "data": data }),
            credentials: data,
        }
    }

    #[test]
    fn test_from_payload_derives_domain_and_count() {
        let set = InterceptedCredentialSet::from_payload(payload(
            "https://sheggle.app.n8n.cloud/rest/credentials?includeScopes=true&includeData=true",
            2,
        ));
        assert_eq!(set.domain, "sheggle.app.n8n.cloud");
        assert_eq!(set.credential_count, 2);
        assert_eq!(set.timestamp, 1_736_244_000_000);
    }

    #[test]
    fn test_unparseable_url_is_unknown_domain() {
        let set = InterceptedCredentialSet::from_payload(payload("/rest/credentials", 0));
        assert_eq!(set.domain, "unknown");
    }

    #[test]
    fn test_wire_shape() {
        let set = InterceptedCredentialSet::from_payload(payload("https://a.io/rest/credentials", 1));
        let json = serde_json::to_value(&set).unwrap();
        for key in ["timestamp", "url", "rawResponse", "domain", "credentialCount"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_summaries_skip_secrets() {
        let set = InterceptedCredentialSet::from_payload(payload("https://a.io/x", 2));
        let summaries = set.summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].id, "cred_1");
        assert_eq!(summaries[1].kind, "slackApi");
        let json = serde_json::to_value(&summaries[0]).unwrap();
        assert_eq!(json["type"], "slackApi");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_capture_overwrites_and_clear_nulls() {
        let store = Arc::new(MemoryStore::new());
        let creds = CredentialStore::new(store.clone());
        assert!(creds.get().unwrap().is_none());

        creds
            .capture(&InterceptedCredentialSet::from_payload(payload("https://a.io/x", 3)))
            .unwrap();
        creds
            .capture(&InterceptedCredentialSet::from_payload(payload("https://b.io/x", 1)))
            .unwrap();
        let current = creds.get().unwrap().unwrap();
        assert_eq!(current.domain, "b.io");
        assert_eq!(current.credential_count, 1);

        creds.clear().unwrap();
        assert!(creds.get().unwrap().is_none());
        assert_eq!(store.get(keys::CREDENTIALS).unwrap(), Some(Value::Null));
    }
}
