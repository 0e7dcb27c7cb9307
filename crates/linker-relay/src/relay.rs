//! The relay task and its handle.

use std::sync::Arc;

use linker_core::{Error, Result};
use linker_intercept::{CaptureHook, CapturePayload};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::credentials::{CredentialStore, InterceptedCredentialSet};
use crate::notify::{Notification, Notifier};
use crate::protocol::{RelayRequest, RelayResponse};

/// Handles relay messages against the credential store.
pub struct Relay {
    credentials: CredentialStore,
    notifier: Arc<dyn Notifier>,
}

impl Relay {
    pub fn new(credentials: CredentialStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            credentials,
            notifier,
        }
    }

    pub fn handle(&self, request: RelayRequest) -> RelayResponse {
        debug!("Relay message: {}", request.kind());
        match request {
            RelayRequest::Credentials { payload } => self.capture(payload),
            RelayRequest::GetCredentials => match self.credentials.get() {
                Ok(credentials) => RelayResponse::Credentials { credentials },
                Err(e) => {
                    warn!("Failed to read stored credentials: {}", e);
                    RelayResponse::Credentials { credentials: None }
                }
            },
            RelayRequest::ClearCredentials => match self.credentials.clear() {
                Ok(()) => {
                    info!("Cleared stored credentials");
                    RelayResponse::ok()
                }
                Err(e) => RelayResponse::failed(e.to_string()),
            },
        }
    }

    fn capture(&self, payload: CapturePayload) -> RelayResponse {
        let set = InterceptedCredentialSet::from_payload(payload);
        if let Err(e) = self.credentials.capture(&set) {
            error!("Failed to store captured credentials: {}", e);
            return RelayResponse::failed(e.to_string());
        }
        info!(
            "Stored {} credentials from {}",
            set.credential_count, set.domain
        );
        self.notifier
            .notify(&Notification::credentials_updated(set.credential_count));
        RelayResponse::ok()
    }
}

struct Envelope {
    request: RelayRequest,
    reply: Option<oneshot::Sender<RelayResponse>>,
}

/// Cheap, cloneable sender side of a running relay.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl RelayHandle {
    /// Send a message and wait for its reply.
    pub async fn request(&self, request: RelayRequest) -> Result<RelayResponse> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                request,
                reply: Some(reply),
            })
            .map_err(|_| Error::Relay("relay task has stopped".into()))?;
        rx.await
            .map_err(|_| Error::Relay("relay dropped the reply".into()))
    }

    /// Queue a message without waiting.
    pub fn post(&self, request: RelayRequest) -> Result<()> {
        self.tx
            .send(Envelope {
                request,
                reply: None,
            })
            .map_err(|_| Error::Relay("relay task has stopped".into()))
    }

    pub async fn get_credentials(&self) -> Result<Option<InterceptedCredentialSet>> {
        match self.request(RelayRequest::GetCredentials).await? {
            RelayResponse::Credentials { credentials } => Ok(credentials),
            other => Err(Error::Relay(format!("unexpected reply: {:?}", other))),
        }
    }

    pub async fn clear_credentials(&self) -> Result<()> {
        match self.request(RelayRequest::ClearCredentials).await? {
            RelayResponse::Ack { .. } => Ok(()),
            RelayResponse::Failed { error, .. } => Err(Error::Relay(error)),
            other => Err(Error::Relay(format!("unexpected reply: {:?}", other))),
        }
    }
}

/// Forwarding a capture never blocks the intercepted call.
impl CaptureHook for RelayHandle {
    fn on_capture(&self, payload: CapturePayload) {
        if let Err(e) = self.post(RelayRequest::Credentials { payload }) {
            warn!("Dropping captured credentials: {}", e);
        }
    }
}

/// Spawn the relay on the current runtime. It runs until every handle is dropped.
pub fn spawn_relay(relay: Relay) -> RelayHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
    tokio::spawn(async move {
        info!("Credential relay started");
        while let Some(envelope) = rx.recv().await {
            let response = relay.handle(envelope.request);
            if let Some(reply) = envelope.reply {
                let _ = reply.send(response);
            }
        }
        debug!("Credential relay stopped");
    });
    RelayHandle { tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::tests::payload;
    use linker_store::MemoryStore;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: &Notification) {
            self.seen.lock().push(notification.clone());
        }
    }

    fn relay() -> (Arc<RecordingNotifier>, Relay) {
        let notifier = Arc::new(RecordingNotifier::default());
        let relay = Relay::new(
            CredentialStore::new(Arc::new(MemoryStore::new())),
            notifier.clone(),
        );
        (notifier, relay)
    }

    #[test]
    fn test_capture_is_idempotent_but_notifies_each_time() {
        let (notifier, relay) = relay();
        let p = payload("https://n8n.local/rest/credentials?includeScopes=true&includeData=true", 2);

        assert_eq!(relay.handle(RelayRequest::Credentials { payload: p.clone() }), RelayResponse::ok());
        let first = relay.handle(RelayRequest::GetCredentials);
        assert_eq!(relay.handle(RelayRequest::Credentials { payload: p }), RelayResponse::ok());
        let second = relay.handle(RelayRequest::GetCredentials);

        assert_eq!(first, second);
        let seen = notifier.seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].title, "n8n credentials updated");
        assert_eq!(seen[0].message, "Found 2 credentials");
    }

    #[test]
    fn test_clear_then_get_is_null() {
        let (notifier, relay) = relay();
        relay.handle(RelayRequest::Credentials {
            payload: payload("https://a.io/rest/credentials", 1),
        });

        assert_eq!(relay.handle(RelayRequest::ClearCredentials), RelayResponse::ok());
        assert_eq!(
            relay.handle(RelayRequest::GetCredentials),
            RelayResponse::Credentials { credentials: None }
        );
        assert_eq!(notifier.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_handle_round_trip_through_task() {
        let (_notifier, relay) = relay();
        let handle = spawn_relay(relay);

        handle.on_capture(payload("https://sheggle.app.n8n.cloud/rest/credentials", 3));
        let stored = handle.get_credentials().await.unwrap().unwrap();
        assert_eq!(stored.domain, "sheggle.app.n8n.cloud");
        assert_eq!(stored.credential_count, 3);

        handle.clear_credentials().await.unwrap();
        assert!(handle.get_credentials().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_messages_handled_in_order() {
        let (_notifier, relay) = relay();
        let handle = spawn_relay(relay);

        handle.on_capture(payload("https://a.io/rest/credentials", 1));
        handle.on_capture(payload("https://b.io/rest/credentials", 4));

        let stored = handle.get_credentials().await.unwrap().unwrap();
        assert_eq!(stored.domain, "b.io");
        assert_eq!(stored.credential_count, 4);
    }
}
