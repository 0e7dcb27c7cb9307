//! Per-domain conversation session ids.

use std::collections::HashMap;
use std::sync::Arc;

use linker_core::Result;
use tracing::debug;

use crate::keys;
use crate::kv::{KvStore, KvStoreExt};

/// Domain → last session id handed out by the assistant service.
///
/// `set` and `clear` read the whole `sessionIds` map, change one entry and
/// write the map back. Concurrent writers may lose each other's update.
#[derive(Clone)]
pub struct SessionRegistry {
    store: Arc<dyn KvStore>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, domain: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(domain))
    }

    /// Record the session id for a domain, replacing any previous one.
    pub fn set(&self, domain: &str, session_id: &str) -> Result<()> {
        let mut sessions = self.load()?;
        sessions.insert(domain.to_string(), session_id.to_string());
        self.store.set_typed(keys::SESSION_IDS, &sessions)?;
        debug!("Session for {} set to {}", domain, session_id);
        Ok(())
    }

    pub fn clear(&self, domain: &str) -> Result<()> {
        let mut sessions = self.load()?;
        if sessions.remove(domain).is_some() {
            self.store.set_typed(keys::SESSION_IDS, &sessions)?;
            debug!("Session for {} cleared", domain);
        }
        Ok(())
    }

    /// Full snapshot of the registry.
    pub fn all(&self) -> Result<HashMap<String, String>> {
        self.load()
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        Ok(self
            .store
            .get_typed::<HashMap<String, String>>(keys::SESSION_IDS)?
            .unwrap_or_default())
    }
}
