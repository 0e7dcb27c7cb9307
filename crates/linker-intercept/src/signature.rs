//! Which outbound calls get captured.

use serde::{Deserialize, Serialize};

pub const CREDENTIALS_PATH: &str = "/rest/credentials";
pub const CREDENTIALS_PARAMS: &[&str] = &["includeScopes=true", "includeData=true"];

/// Path plus required query fragments, all matched as substrings.
///
/// Substring matching keeps the rule working when the target service adds
/// unrelated parameters or reorders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSignature {
    pub path: String,
    pub required_params: Vec<String>,
}

impl TargetSignature {
    pub fn new(path: impl Into<String>, required_params: &[&str]) -> Self {
        Self {
            path: path.into(),
            required_params: required_params.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// The n8n credential listing with decrypted data.
    pub fn n8n_credentials() -> Self {
        Self::new(CREDENTIALS_PATH, CREDENTIALS_PARAMS)
    }

    pub fn should_capture(&self, url: &str) -> bool {
        !url.is_empty()
            && url.contains(&self.path)
            && self.required_params.iter().all(|p| url.contains(p.as_str()))
    }
}

impl Default for TargetSignature {
    fn default() -> Self {
        Self::n8n_credentials()
    }
}
