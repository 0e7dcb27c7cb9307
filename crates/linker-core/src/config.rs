//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Error;

pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_RELAY_PORT: u16 = 8765;

/// Paths to all Linker data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Key-value store backing all persisted state (`data/storage.json`).
    pub storage_file: PathBuf,
    /// Credential exports (`data/exports/`).
    pub exports: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            storage_file: root.join("storage.json"),
            exports: root.join("exports"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.exports)?;
        Ok(())
    }
}

/// Deployment environment. Anything unrecognised is treated as production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            _ => Self::Production,
        }
    }
}

/// Which revision of the stream envelope the chat client accepts.
///
/// The assistant service has shipped three incompatible shapes:
/// plain-text progress lines, `{type, text}` at the top level, and
/// `{type, data}` where `data` may hold a second JSON document.
/// `Auto` accepts all of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    #[default]
    Auto,
    Legacy,
    Flat,
    Enveloped,
}

impl ProtocolVersion {
    /// Non-JSON frames count as progress text.
    pub fn accepts_plain_text(self) -> bool {
        matches!(self, Self::Auto | Self::Legacy)
    }

    /// JSON frames without a `type` field count as progress text.
    pub fn accepts_untyped(self) -> bool {
        matches!(self, Self::Auto | Self::Legacy)
    }

    /// Result text may sit at the top level next to `type`.
    pub fn accepts_flat(self) -> bool {
        matches!(self, Self::Auto | Self::Flat)
    }

    /// Payload may sit under `data`, possibly JSON-encoded a second time.
    pub fn accepts_enveloped(self) -> bool {
        matches!(self, Self::Auto | Self::Enveloped)
    }
}

impl FromStr for ProtocolVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "legacy" | "plain" => Ok(Self::Legacy),
            "flat" => Ok(Self::Flat),
            "enveloped" => Ok(Self::Enveloped),
            other => Err(Error::Config(format!("unknown protocol version: {}", other))),
        }
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Legacy => write!(f, "legacy"),
            Self::Flat => write!(f, "flat"),
            Self::Enveloped => write!(f, "enveloped"),
        }
    }
}

/// Top-level Linker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkerConfig {
    pub env: Environment,
    /// Base URL of the assistant service, without a trailing slash.
    pub service_url: String,
    /// Port the background relay listens on.
    pub relay_port: u16,
    pub protocol: ProtocolVersion,
    pub data_paths: DataPaths,
}

impl LinkerConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> crate::Result<Self> {
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup(
        data_dir: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> crate::Result<Self> {
        let env = lookup("LINKER_ENV")
            .or_else(|| lookup("ENV"))
            .map(|v| Environment::parse_lenient(&v))
            .unwrap_or(Environment::Production);

        let service_url = lookup("LINKER_SERVICE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

        let relay_port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_RELAY_PORT);

        let protocol = match lookup("LINKER_PROTOCOL") {
            Some(v) => v.parse()?,
            None => ProtocolVersion::default(),
        };

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            env,
            service_url,
            relay_port,
            protocol,
            data_paths,
        })
    }

    /// Streaming chat endpoint.
    pub fn stream_url(&self) -> String {
        format!("{}/chat/stream", self.service_url)
    }

    /// Non-streaming chat endpoint.
    pub fn legacy_url(&self) -> String {
        format!("{}/chat", self.service_url)
    }

    pub fn feedback_url(&self) -> String {
        format!("{}/feedback", self.service_url)
    }

    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }

    /// Log every decoded frame. Development only.
    pub fn enable_stream_logging(&self) -> bool {
        self.is_development()
    }

    pub fn log_level(&self) -> &'static str {
        if self.is_development() {
            "debug"
        } else {
            "info"
        }
    }
}
