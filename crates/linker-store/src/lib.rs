//! Persisted key-value state shared by the chat client and the relay.
//!
//! Every typed accessor here does a whole-record read-modify-write against a
//! single key. The backing store only replaces whole values, so two writers
//! touching the same key can lose an update; callers accept last-writer-wins.

pub mod domains;
pub mod history;
pub mod kv;
pub mod sessions;
pub mod settings;

pub use domains::DomainStates;
pub use history::{ChatEntry, ChatHistory, Sender};
pub use kv::{JsonFileStore, KvStore, KvStoreExt, MemoryStore};
pub use sessions::SessionRegistry;
pub use settings::{Credentials, Settings};

/// Persisted keys.
pub mod keys {
    pub const DOMAIN_STATES: &str = "domainStates";
    pub const SESSION_IDS: &str = "sessionIds";
    pub const CHAT_HISTORY: &str = "chatHistory";
    pub const CREDENTIALS: &str = "n8nCredentials";
    pub const AUTH_TOKEN: &str = "authToken";
    pub const API_KEY: &str = "apiKey";
    pub const PRIVACY_AGREED: &str = "privacyAgreed";
    pub const PRIVACY_AGREED_DATE: &str = "privacyAgreedDate";
}
