//! Per-domain widget enablement.

use std::collections::HashMap;
use std::sync::Arc;

use linker_core::Result;
use tracing::info;

use crate::keys;
use crate::kv::{KvStore, KvStoreExt};

/// Domain → whether the chat widget is shown there. Unknown domains are off.
#[derive(Clone)]
pub struct DomainStates {
    store: Arc<dyn KvStore>,
}

impl DomainStates {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn is_enabled(&self, domain: &str) -> Result<bool> {
        Ok(self.load()?.get(domain).copied().unwrap_or(false))
    }

    pub fn set(&self, domain: &str, enabled: bool) -> Result<()> {
        let mut states = self.load()?;
        states.insert(domain.to_string(), enabled);
        self.store.set_typed(keys::DOMAIN_STATES, &states)
    }

    /// Flip the flag and return the new value.
    pub fn toggle(&self, domain: &str) -> Result<bool> {
        let mut states = self.load()?;
        let enabled = !states.get(domain).copied().unwrap_or(false);
        states.insert(domain.to_string(), enabled);
        self.store.set_typed(keys::DOMAIN_STATES, &states)?;
        info!("Chat box {} on {}", if enabled { "enabled" } else { "disabled" }, domain);
        Ok(enabled)
    }

    pub fn all(&self) -> Result<HashMap<String, bool>> {
        self.load()
    }

    fn load(&self) -> Result<HashMap<String, bool>> {
        Ok(self
            .store
            .get_typed::<HashMap<String, bool>>(keys::DOMAIN_STATES)?
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    #[test]
    fn test_toggle() {
        let states = DomainStates::new(Arc::new(MemoryStore::new()));
        assert!(!states.is_enabled("n8n.local").unwrap());
        assert!(states.toggle("n8n.local").unwrap());
        assert!(states.is_enabled("n8n.local").unwrap());
        assert!(!states.toggle("n8n.local").unwrap());
        assert!(!states.is_enabled("n8n.local").unwrap());
    }

    #[test]
    fn test_independent_domains() {
        let states = DomainStates::new(Arc::new(MemoryStore::new()));
        states.set("a.com", true).unwrap();
        assert!(!states.is_enabled("b.com").unwrap());
        assert_eq!(states.all().unwrap().len(), 1);
    }
}
