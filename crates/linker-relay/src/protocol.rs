//! Messages exchanged with the relay.

use linker_intercept::CapturePayload;
use serde::{Deserialize, Serialize};

use crate::credentials::InterceptedCredentialSet;

/// `{type: "credentials", payload}`, `{type: "getCredentials"}` or
/// `{type: "clearCredentials"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RelayRequest {
    Credentials { payload: CapturePayload },
    GetCredentials,
    ClearCredentials,
}

impl RelayRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Credentials { .. } => "credentials",
            Self::GetCredentials => "getCredentials",
            Self::ClearCredentials => "clearCredentials",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelayResponse {
    Failed {
        success: bool,
        error: String,
    },
    Ack {
        success: bool,
    },
    Credentials {
        credentials: Option<InterceptedCredentialSet>,
    },
}

impl RelayResponse {
    pub fn ok() -> Self {
        Self::Ack { success: true }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            success: false,
            error: error.into(),
        }
    }
}
