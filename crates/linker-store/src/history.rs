//! Chat transcript persistence.

use std::sync::Arc;

use linker_core::Result;
use serde::{Deserialize, Serialize};

use crate::keys;
use crate::kv::{KvStore, KvStoreExt};
use crate::sessions::SessionRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One rendered chat bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub text: String,
    pub sender: Sender,
}

impl ChatEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
        }
    }
}

/// Ordered chat history under `chatHistory`.
#[derive(Clone)]
pub struct ChatHistory {
    store: Arc<dyn KvStore>,
    sessions: SessionRegistry,
}

impl ChatHistory {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        let sessions = SessionRegistry::new(store.clone());
        Self { store, sessions }
    }

    pub fn load(&self) -> Result<Vec<ChatEntry>> {
        Ok(self
            .store
            .get_typed::<Vec<ChatEntry>>(keys::CHAT_HISTORY)?
            .unwrap_or_default())
    }

    pub fn append(&self, entry: ChatEntry) -> Result<()> {
        let mut entries = self.load()?;
        entries.push(entry);
        self.store.set_typed(keys::CHAT_HISTORY, &entries)
    }

    /// Drop the transcript and forget the conversation for `domain`, so the
    /// next send starts a fresh session there.
    pub fn clear(&self, domain: &str) -> Result<()> {
        self.store
            .set_typed(keys::CHAT_HISTORY, &Vec::<ChatEntry>::new())?;
        self.sessions.clear(domain)
    }
}
