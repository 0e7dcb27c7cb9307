//! Exporting the captured set to a JSON file.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use linker_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::credentials::InterceptedCredentialSet;

/// The exported document. Also sent with chat requests as `n8n_credentials`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub raw_response: Value,
    pub timestamp: i64,
    pub domain: String,
    pub credential_count: usize,
}

impl From<&InterceptedCredentialSet> for ExportBundle {
    fn from(set: &InterceptedCredentialSet) -> Self {
        Self {
            raw_response: set.raw_response.clone(),
            timestamp: set.timestamp,
            domain: set.domain.clone(),
            credential_count: set.credential_count,
        }
    }
}

impl ExportBundle {
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

pub fn export_file_name(domain: &str, date: NaiveDate) -> String {
    format!("n8n-credentials-{}-{}.json", domain, date.format("%Y-%m-%d"))
}

/// Write the bundle for `set` into `dir`, returning the file path.
pub fn write_export(set: &InterceptedCredentialSet, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(&set.domain, date));
    let data = serde_json::to_string_pretty(&ExportBundle::from(set))?;
    std::fs::write(&path, data).map_err(|e| Error::Storage(format!("{}: {}", path.display(), e)))?;
    info!(
        "Exported {} credentials from {} to {}",
        set.credential_count,
        set.domain,
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::tests::payload;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 7).unwrap()
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            export_file_name("sheggle.app.n8n.cloud", date()),
            "n8n-credentials-sheggle.app.n8n.cloud-2025-01-07.json"
        );
    }

    #[test]
    fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let set = InterceptedCredentialSet::from_payload(payload("https://n8n.local/rest/credentials", 2));

        let path = write_export(&set, dir.path(), date()).unwrap();

        assert_eq!(path.file_name().unwrap(), "n8n-credentials-n8n.local-2025-01-07.json");
        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["credentialCount"], 2);
        assert_eq!(written["domain"], "n8n.local");
        assert_eq!(written["rawResponse"]["data"][0]["id"], "cred_0");
        assert!(written.get("url").is_none());
    }
}
