//! Service credentials and the privacy agreement flag.

use std::sync::Arc;

use linker_core::{Error, Result};
use serde_json::Value;

use crate::keys;
use crate::kv::{KvStore, KvStoreExt};

/// Auth material required before any chat request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub auth_token: String,
    pub api_key: String,
}

#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn KvStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn auth_token(&self) -> Result<Option<String>> {
        self.non_empty(keys::AUTH_TOKEN)
    }

    /// Store the service auth token. Whitespace is trimmed.
    pub fn set_auth_token(&self, token: &str) -> Result<()> {
        self.store
            .set(keys::AUTH_TOKEN, Value::String(token.trim().to_string()))
    }

    pub fn api_key(&self) -> Result<Option<String>> {
        self.non_empty(keys::API_KEY)
    }

    /// Store the n8n API key. Whitespace is trimmed.
    pub fn set_api_key(&self, key: &str) -> Result<()> {
        self.store
            .set(keys::API_KEY, Value::String(key.trim().to_string()))
    }

    pub fn privacy_agreed(&self) -> Result<bool> {
        Ok(self
            .store
            .get_typed::<bool>(keys::PRIVACY_AGREED)?
            .unwrap_or(false))
    }

    pub fn privacy_agreed_date(&self) -> Result<Option<String>> {
        self.store.get_typed(keys::PRIVACY_AGREED_DATE)
    }

    pub fn accept_privacy(&self) -> Result<()> {
        self.store.set(keys::PRIVACY_AGREED, Value::Bool(true))?;
        self.store.set(
            keys::PRIVACY_AGREED_DATE,
            Value::String(chrono::Utc::now().to_rfc3339()),
        )
    }

    /// Both the auth token and the API key, or a [`Error::MissingConfig`]
    /// naming the first one absent.
    pub fn require_credentials(&self) -> Result<Credentials> {
        let auth_token = self.auth_token()?.ok_or_else(|| {
            Error::MissingConfig("Please set your service auth token".into())
        })?;
        let api_key = self
            .api_key()?
            .ok_or_else(|| Error::MissingConfig("Please set your n8n API key".into()))?;
        Ok(Credentials {
            auth_token,
            api_key,
        })
    }

    fn non_empty(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .get_typed::<String>(key)?
            .filter(|v| !v.trim().is_empty()))
    }
}
