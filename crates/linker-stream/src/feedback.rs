//! Free-text feedback to the assistant service.

use linker_core::{Error, LinkerConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: String,
}

/// The service's acknowledgement, e.g. `{"status":"success","message":"Thank you for your feedback!"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackReceipt {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

pub struct FeedbackClient {
    http: Client,
    url: String,
}

impl FeedbackClient {
    pub fn new(config: &LinkerConfig) -> Self {
        Self::with_url(config.feedback_url())
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
        }
    }

    /// Post trimmed `text`. Blank text is rejected without a request.
    pub async fn submit(&self, text: &str) -> Result<FeedbackReceipt> {
        let feedback = text.trim();
        if feedback.is_empty() {
            return Err(Error::InvalidInput("Please enter feedback".into()));
        }

        debug!("POST {}", self.url);
        let response = self
            .http
            .post(&self.url)
            .json(&FeedbackRequest {
                feedback: feedback.to_string(),
            })
            .send()
            .await
            .map_err(|e| Error::Http(format!("Could not connect to the assistant service: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body: if body.trim().is_empty() {
                    status.to_string()
                } else {
                    body
                },
            });
        }

        let receipt = response
            .json::<FeedbackReceipt>()
            .await
            .map_err(|e| Error::Protocol(format!("Malformed response: {}", e)))?;
        info!("Feedback sent ({})", receipt.status);
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_feedback_rejected() {
        // Nothing listens here; a request would fail with an HTTP error.
        let client = FeedbackClient::with_url("http://127.0.0.1:9/feedback");
        let err = client.submit("   \n").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(err.to_string(), "Please enter feedback");
    }

    #[test]
    fn test_receipt_tolerates_missing_fields() {
        let receipt: FeedbackReceipt = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert_eq!(receipt.status, "success");
        assert_eq!(receipt.message, "");
    }
}
