//! Credential relay: the background owner of the last captured credential set.
//!
//! Captures arrive from the interception layer as [`RelayRequest`] messages and
//! are handled one at a time by a task spawned with [`spawn_relay`]. Settings
//! and chat surfaces read the set back through the same channel.

pub mod credentials;
pub mod export;
pub mod notify;
pub mod protocol;
pub mod relay;

pub use credentials::{CredentialStore, CredentialSummary, InterceptedCredentialSet};
pub use export::{export_file_name, write_export, ExportBundle};
pub use notify::{LogNotifier, Notification, Notifier};
pub use protocol::{RelayRequest, RelayResponse};
pub use relay::{spawn_relay, Relay, RelayHandle};
