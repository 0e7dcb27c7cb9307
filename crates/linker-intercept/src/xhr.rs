//! XHR surface: an open/send object whose completion is observed through
//! ready-state changes.

use std::sync::Arc;

use bytes::Bytes;

use crate::interceptor::Interceptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    Unsent = 0,
    Opened = 1,
    HeadersReceived = 2,
    Loading = 3,
    Done = 4,
}

/// A request object used as `open`, then `send`, then polled through ready
/// state changes until [`ReadyState::Done`].
pub trait XhrTransport {
    fn open(&mut self, method: &str, url: &str);

    fn send(&mut self, body: Option<Bytes>);

    fn ready_state(&self) -> ReadyState;

    fn status(&self) -> u16;

    fn response_text(&self) -> &str;

    /// Called by the driver after every ready state change.
    fn ready_state_changed(&mut self) {}

    /// Whether calls on this transport are already observed by a tap.
    fn is_tapped(&self) -> bool {
        false
    }
}

/// Per-request tap state. The URL is only known between `open` and `send`,
/// so it is carried here until the response completes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum XhrState {
    #[default]
    Unopened,
    Opened {
        url: String,
    },
    Sent {
        url: String,
        watching: bool,
    },
    Done,
}

/// Wraps an [`XhrTransport`]. Every call is delegated unchanged; when a sent
/// URL matches and the request completes with status 200, the response text
/// is inspected.
pub struct TappedXhr<X> {
    inner: X,
    interceptor: Arc<Interceptor>,
    state: XhrState,
}

impl<X: XhrTransport> TappedXhr<X> {
    pub fn new(inner: X, interceptor: Arc<Interceptor>) -> Self {
        Self {
            inner,
            interceptor,
            state: XhrState::Unopened,
        }
    }

    pub fn state(&self) -> &XhrState {
        &self.state
    }

    pub fn inner(&self) -> &X {
        &self.inner
    }

    pub fn into_inner(self) -> X {
        self.inner
    }
}

impl<X: XhrTransport> XhrTransport for TappedXhr<X> {
    fn open(&mut self, method: &str, url: &str) {
        self.state = XhrState::Opened {
            url: url.to_string(),
        };
        self.inner.open(method, url);
    }

    fn send(&mut self, body: Option<Bytes>) {
        if let XhrState::Opened { url } = std::mem::take(&mut self.state) {
            // An inner tap already observes this call.
            let watching = !self.inner.is_tapped() && self.interceptor.should_capture(&url);
            self.state = XhrState::Sent { url, watching };
        }
        self.inner.send(body);
    }

    fn ready_state(&self) -> ReadyState {
        self.inner.ready_state()
    }

    fn status(&self) -> u16 {
        self.inner.status()
    }

    fn response_text(&self) -> &str {
        self.inner.response_text()
    }

    fn ready_state_changed(&mut self) {
        // Only a sent request completes; a DONE seen before `send` is stale.
        if self.inner.ready_state() == ReadyState::Done && matches!(self.state, XhrState::Sent { .. })
        {
            if let XhrState::Sent { url, watching } = std::mem::replace(&mut self.state, XhrState::Done)
            {
                if watching && self.inner.status() == 200 {
                    self.interceptor
                        .inspect(&url, self.inner.response_text().as_bytes());
                }
            }
        }
        self.inner.ready_state_changed();
    }

    fn is_tapped(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::tests::recording;

    const MATCHING: &str =
        "https://n8n.local/rest/credentials?includeScopes=true&other=1&includeData=true";
    const BODY: &str = r#"{"data":[{"id":"1","name":"Slack","type":"slackApi"}]}"#;

    /// Completes synchronously on `send` with a canned response.
    struct FakeXhr {
        status: u16,
        body: &'static str,
        ready: ReadyState,
        opened: Vec<(String, String)>,
        sends: usize,
    }

    impl FakeXhr {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                ready: ReadyState::Unsent,
                opened: Vec::new(),
                sends: 0,
            }
        }
    }

    impl XhrTransport for FakeXhr {
        fn open(&mut self, method: &str, url: &str) {
            self.opened.push((method.to_string(), url.to_string()));
            self.ready = ReadyState::Opened;
        }
        fn send(&mut self, _body: Option<Bytes>) {
            self.sends += 1;
            self.ready = ReadyState::Done;
        }
        fn ready_state(&self) -> ReadyState {
            self.ready
        }
        fn status(&self) -> u16 {
            self.status
        }
        fn response_text(&self) -> &str {
            self.body
        }
    }

    fn drive<X: XhrTransport>(xhr: &mut X, url: &str) {
        xhr.open("GET", url);
        xhr.send(None);
        xhr.ready_state_changed();
    }

    #[test]
    fn test_match_on_done_with_success() {
        let (hook, interceptor) = recording();
        let mut xhr = interceptor.wrap_xhr(FakeXhr::new(200, BODY));

        drive(&mut xhr, MATCHING);

        assert_eq!(xhr.state(), &XhrState::Done);
        assert_eq!(xhr.response_text(), BODY);
        assert_eq!(xhr.inner().opened, vec![("GET".to_string(), MATCHING.to_string())]);
        assert_eq!(xhr.inner().sends, 1);
        let payloads = hook.payloads.lock();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].url, MATCHING);
    }

    #[test]
    fn test_error_status_not_captured() {
        let (hook, interceptor) = recording();
        let mut xhr = interceptor.wrap_xhr(FakeXhr::new(401, BODY));

        drive(&mut xhr, MATCHING);

        assert_eq!(xhr.status(), 401);
        assert!(hook.payloads.lock().is_empty());
    }

    #[test]
    fn test_non_matching_url_not_watched() {
        let (hook, interceptor) = recording();
        let mut xhr = interceptor.wrap_xhr(FakeXhr::new(200, BODY));

        xhr.open("GET", "https://n8n.local/rest/credentials?includeScopes=true");
        xhr.send(None);
        assert!(matches!(xhr.state(), XhrState::Sent { watching: false, .. }));
        xhr.ready_state_changed();

        assert!(hook.payloads.lock().is_empty());
    }

    #[test]
    fn test_intermediate_states_ignored() {
        let (hook, interceptor) = recording();
        let mut fake = FakeXhr::new(200, BODY);
        fake.open("GET", MATCHING);
        let mut xhr = interceptor.wrap_xhr(fake);

        xhr.open("GET", MATCHING);
        xhr.ready_state_changed();
        assert!(hook.payloads.lock().is_empty());
        assert!(matches!(xhr.state(), XhrState::Opened { .. }));
    }

    #[test]
    fn test_stale_done_before_send_keeps_request_open() {
        let (hook, interceptor) = recording();
        let mut xhr = interceptor.wrap_xhr(FakeXhr::new(200, BODY));

        xhr.open("GET", MATCHING);
        // A reused transport still reporting the previous request's DONE.
        xhr.inner.ready = ReadyState::Done;
        xhr.ready_state_changed();
        assert_eq!(
            xhr.state(),
            &XhrState::Opened {
                url: MATCHING.to_string()
            }
        );
        assert!(hook.payloads.lock().is_empty());

        xhr.send(None);
        xhr.ready_state_changed();
        assert_eq!(xhr.state(), &XhrState::Done);
        assert_eq!(hook.payloads.lock().len(), 1);
    }

    #[test]
    fn test_nested_taps_forward_once() {
        let (hook, interceptor) = recording();
        let mut xhr = interceptor.wrap_xhr(interceptor.wrap_xhr(FakeXhr::new(200, BODY)));

        drive(&mut xhr, MATCHING);

        assert_eq!(hook.payloads.lock().len(), 1);
        assert_eq!(xhr.into_inner().into_inner().sends, 1);
    }

    #[test]
    fn test_unparseable_body_swallowed() {
        let (hook, interceptor) = recording();
        let mut xhr = interceptor.wrap_xhr(FakeXhr::new(200, "<html>"));

        drive(&mut xhr, MATCHING);

        assert_eq!(xhr.response_text(), "<html>");
        assert!(hook.payloads.lock().is_empty());
    }
}
