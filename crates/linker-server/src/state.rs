//! Shared application state.

use std::sync::Arc;

use linker_core::LinkerConfig;
use linker_relay::{spawn_relay, CredentialStore, LogNotifier, Relay, RelayHandle};
use linker_store::{JsonFileStore, KvStore};

/// State shared by route handlers and CLI commands.
pub struct AppState {
    pub config: LinkerConfig,
    pub store: Arc<dyn KvStore>,
    pub relay: RelayHandle,
}

impl AppState {
    /// Open the persisted store and start the credential relay on it.
    /// Must be called from within a tokio runtime.
    pub fn new(config: LinkerConfig) -> Self {
        let store: Arc<dyn KvStore> = Arc::new(JsonFileStore::open(&config.data_paths.storage_file));
        Self::with_store(config, store)
    }

    pub fn with_store(config: LinkerConfig, store: Arc<dyn KvStore>) -> Self {
        let relay = spawn_relay(Relay::new(
            CredentialStore::new(store.clone()),
            Arc::new(LogNotifier),
        ));
        Self {
            config,
            store,
            relay,
        }
    }
}
