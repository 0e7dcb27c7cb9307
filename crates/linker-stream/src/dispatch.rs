//! Event dispatch: drives the chat surface and the session registry.

use std::time::Duration;

use linker_core::Error;
use linker_store::SessionRegistry;
use tracing::{debug, warn};

use crate::events::StreamEvent;

pub const LOADING_TEXT: &str = "Answering your request might take a while...";
pub const RELOAD_NOTICE: &str = "Reloading page to show workflow...";

/// Follow-up the page integration layer performs after a result. The client
/// never navigates on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostCompletion {
    /// Show `notice` after `notice_after`, then reload the page after a
    /// further `reload_after`.
    ReloadPage {
        notice: String,
        notice_after: Duration,
        reload_after: Duration,
    },
}

impl PostCompletion {
    pub fn reload_page() -> Self {
        Self::ReloadPage {
            notice: RELOAD_NOTICE.to_string(),
            notice_after: Duration::from_secs(1),
            reload_after: Duration::from_secs(2),
        }
    }
}

/// The chat surface a send renders into.
pub trait ChatSink: Send {
    /// A send is under way; show the loading indicator.
    fn loading(&mut self, text: &str);

    /// Replace the loading indicator's status text in place.
    fn progress(&mut self, status: &str);

    /// Replace the loading indicator with the final answer.
    fn result(&mut self, text: &str);

    /// Replace the loading indicator with an error message.
    fn error(&mut self, message: &str);

    /// The transport closed without a result or error.
    fn loading_finished(&mut self) {}

    fn post_completion(&mut self, _action: PostCompletion) {}
}

/// How a send ended.
#[derive(Debug)]
pub enum ChatOutcome {
    Completed {
        text: String,
        session_id: Option<String>,
    },
    Failed(Error),
    /// The stream closed before any terminal event.
    Incomplete,
}

impl ChatOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Dispatches events of one stream, strictly in arrival order.
pub struct Dispatcher<'a, S: ChatSink + ?Sized> {
    domain: &'a str,
    sessions: &'a SessionRegistry,
    sink: &'a mut S,
}

impl<'a, S: ChatSink + ?Sized> Dispatcher<'a, S> {
    pub fn new(domain: &'a str, sessions: &'a SessionRegistry, sink: &'a mut S) -> Self {
        Self {
            domain,
            sessions,
            sink,
        }
    }

    pub fn sink(&mut self) -> &mut S {
        &mut *self.sink
    }

    /// Apply one event. `Some` means the stream is over and no further frame
    /// may be dispatched.
    pub fn dispatch(&mut self, event: StreamEvent) -> Option<ChatOutcome> {
        match event {
            StreamEvent::Result { text, session_id } => {
                self.sink.result(&text);
                if let Some(id) = &session_id {
                    if let Err(e) = self.sessions.set(self.domain, id) {
                        warn!("Failed to store session for {}: {}", self.domain, e);
                    }
                }
                self.sink.post_completion(PostCompletion::reload_page());
                Some(ChatOutcome::Completed { text, session_id })
            }
            StreamEvent::Error { message } => {
                self.sink.error(&message);
                Some(ChatOutcome::Failed(Error::Protocol(message)))
            }
            StreamEvent::ProgressUpdate { status } => {
                self.sink.progress(&status);
                None
            }
            StreamEvent::Unrecognized { raw } => {
                debug!("Skipping unrecognized frame: {}", raw);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use linker_store::MemoryStore;
    use std::sync::Arc;

    /// Records every sink call in order.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        pub calls: Vec<String>,
        pub actions: Vec<PostCompletion>,
    }

    impl ChatSink for RecordingSink {
        fn loading(&mut self, text: &str) {
            self.calls.push(format!("loading:{}", text));
        }
        fn progress(&mut self, status: &str) {
            self.calls.push(format!("progress:{}", status));
        }
        fn result(&mut self, text: &str) {
            self.calls.push(format!("result:{}", text));
        }
        fn error(&mut self, message: &str) {
            self.calls.push(format!("error:{}", message));
        }
        fn loading_finished(&mut self) {
            self.calls.push("finished".into());
        }
        fn post_completion(&mut self, action: PostCompletion) {
            self.actions.push(action);
        }
    }

    #[test]
    fn test_result_sets_session_and_requests_reload() {
        let sessions = SessionRegistry::new(Arc::new(MemoryStore::new()));
        let mut sink = RecordingSink::default();
        let mut dispatcher = Dispatcher::new("example.com", &sessions, &mut sink);

        let outcome = dispatcher.dispatch(StreamEvent::Result {
            text: "hi".into(),
            session_id: Some("s1".into()),
        });

        assert!(outcome.unwrap().is_completed());
        assert_eq!(sessions.get("example.com").unwrap().as_deref(), Some("s1"));
        assert_eq!(sink.calls, vec!["result:hi"]);
        assert_eq!(sink.actions, vec![PostCompletion::reload_page()]);
    }

    #[test]
    fn test_result_without_session_keeps_previous() {
        let sessions = SessionRegistry::new(Arc::new(MemoryStore::new()));
        sessions.set("example.com", "old").unwrap();
        let mut sink = RecordingSink::default();
        let mut dispatcher = Dispatcher::new("example.com", &sessions, &mut sink);

        dispatcher.dispatch(StreamEvent::Result {
            text: "hi".into(),
            session_id: None,
        });

        assert_eq!(sessions.get("example.com").unwrap().as_deref(), Some("old"));
    }

    #[test]
    fn test_progress_and_unrecognized_continue() {
        let sessions = SessionRegistry::new(Arc::new(MemoryStore::new()));
        let mut sink = RecordingSink::default();
        let mut dispatcher = Dispatcher::new("example.com", &sessions, &mut sink);

        assert!(dispatcher
            .dispatch(StreamEvent::ProgressUpdate {
                status: "step1".into()
            })
            .is_none());
        assert!(dispatcher
            .dispatch(StreamEvent::Unrecognized { raw: "?".into() })
            .is_none());
        assert_eq!(sink.calls, vec!["progress:step1"]);
    }

    #[test]
    fn test_error_terminates() {
        let sessions = SessionRegistry::new(Arc::new(MemoryStore::new()));
        let mut sink = RecordingSink::default();
        let mut dispatcher = Dispatcher::new("example.com", &sessions, &mut sink);

        let outcome = dispatcher.dispatch(StreamEvent::Error {
            message: "bad token".into(),
        });

        assert!(matches!(outcome, Some(ChatOutcome::Failed(Error::Protocol(ref m))) if m == "bad token"));
        assert_eq!(sink.calls, vec!["error:bad token"]);
        assert!(sink.actions.is_empty());
    }
}
