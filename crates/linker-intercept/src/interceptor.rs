use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::fetch::CaptureLayer;
use crate::payload::CapturePayload;
use crate::signature::TargetSignature;
use crate::xhr::{TappedXhr, XhrTransport};

/// Receives captured payloads. Implementations must not block: the hook runs
/// on the caller's request path.
pub trait CaptureHook: Send + Sync {
    fn on_capture(&self, payload: CapturePayload);
}

impl<F> CaptureHook for F
where
    F: Fn(CapturePayload) + Send + Sync,
{
    fn on_capture(&self, payload: CapturePayload) {
        self(payload)
    }
}

/// Signature plus hook, shared by both request surfaces.
#[derive(Clone)]
pub struct Interceptor {
    signature: TargetSignature,
    hook: Arc<dyn CaptureHook>,
}

impl Interceptor {
    pub fn new(signature: TargetSignature, hook: Arc<dyn CaptureHook>) -> Self {
        Self { signature, hook }
    }

    pub fn signature(&self) -> &TargetSignature {
        &self.signature
    }

    pub fn should_capture(&self, url: &str) -> bool {
        self.signature.should_capture(url)
    }

    /// Parse a matched body and forward it. Parse failures are logged and
    /// swallowed so the caller's call never sees them.
    pub fn inspect(&self, url: &str, body: &[u8]) {
        match CapturePayload::from_body(url, body) {
            Ok(payload) => {
                info!(
                    "Captured {} credentials from {}",
                    payload.item_count(),
                    url
                );
                self.hook.on_capture(payload);
            }
            Err(e) => {
                warn!("Failed to parse captured response from {}: {}", url, e);
                debug!("Unparsed body was {} bytes", body.len());
            }
        }
    }

    /// Tower layer for fetch-style services.
    pub fn layer(&self) -> CaptureLayer {
        CaptureLayer::new(Arc::new(self.clone()))
    }

    /// Wrap an XHR-style transport.
    pub fn wrap_xhr<X: XhrTransport>(&self, inner: X) -> TappedXhr<X> {
        TappedXhr::new(inner, Arc::new(self.clone()))
    }
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Collects every forwarded payload.
    #[derive(Default)]
    pub(crate) struct RecordingHook {
        pub payloads: Mutex<Vec<CapturePayload>>,
    }

    impl CaptureHook for RecordingHook {
        fn on_capture(&self, payload: CapturePayload) {
            self.payloads.lock().push(payload);
        }
    }

    pub(crate) fn recording() -> (Arc<RecordingHook>, Interceptor) {
        let hook = Arc::new(RecordingHook::default());
        let interceptor = Interceptor::new(TargetSignature::n8n_credentials(), hook.clone());
        (hook, interceptor)
    }

    #[test]
    fn test_inspect_forwards_parsed_payload() {
        let (hook, interceptor) = recording();
        interceptor.inspect("https://n8n.local/rest/credentials", br#"{"data":[{"id":"1"}]}"#);

        let payloads = hook.payloads.lock();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].url, "https://n8n.local/rest/credentials");
        assert_eq!(payloads[0].item_count(), 1);
    }

    #[test]
    fn test_inspect_swallows_parse_failure() {
        let (hook, interceptor) = recording();
        interceptor.inspect("https://n8n.local/rest/credentials", b"not json");
        assert!(hook.payloads.lock().is_empty());
    }

    #[test]
    fn test_closure_hook() {
        let seen = Arc::new(Mutex::new(0usize));
        let counter = seen.clone();
        let interceptor = Interceptor::new(
            TargetSignature::n8n_credentials(),
            Arc::new(move |p: CapturePayload| *counter.lock() += p.item_count()),
        );
        interceptor.inspect("u", br#"{"data":[1,2,3]}"#);
        assert_eq!(*seen.lock(), 3);
    }
}
