//! HTTP client for the assistant service.
//!
//! `send` posts to the streaming endpoint and feeds the line-framed body
//! through the decoder and dispatcher. `send_legacy` talks to the older
//! single-response endpoint and maps its answer onto the same result path.

use std::sync::Arc;

use futures::Stream;
use linker_core::{domain_of, Error, LinkerConfig, ProtocolVersion};
use linker_store::{KvStore, SessionRegistry, Settings};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::decoder::decode_frames;
use crate::dispatch::{ChatOutcome, ChatSink, Dispatcher, LOADING_TEXT};
use crate::events::{parse_event, StreamEvent};

/// What the user typed and where.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub message: String,
    /// Full URL of the page the chat was opened on.
    pub page_url: String,
    /// Last captured credential export, forwarded to the service as-is.
    pub platform_credentials: Option<Value>,
}

impl OutgoingMessage {
    pub fn new(message: impl Into<String>, page_url: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            page_url: page_url.into(),
            platform_credentials: None,
        }
    }

    pub fn with_platform_credentials(mut self, credentials: Value) -> Self {
        self.platform_credentials = Some(credentials);
        self
    }
}

/// JSON body accepted by both chat endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequestBody {
    pub message: String,
    pub auth_token: String,
    pub api_key: String,
    pub api_url: String,
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n8n_credentials: Option<Value>,
}

/// Single-response answer from the legacy endpoint.
#[derive(Debug, Deserialize)]
struct LegacyResponse {
    response: String,
    #[serde(default)]
    session_id: Option<String>,
}

/// Chat client. One send at a time per page; nothing is retried.
pub struct ChatClient {
    http: Client,
    stream_url: String,
    legacy_url: String,
    protocol: ProtocolVersion,
    log_frames: bool,
    settings: Settings,
    sessions: SessionRegistry,
}

impl ChatClient {
    pub fn new(config: &LinkerConfig, store: Arc<dyn KvStore>) -> Self {
        let mut client = Self::with_endpoints(
            config.stream_url(),
            config.legacy_url(),
            config.protocol,
            store,
        );
        client.log_frames = config.enable_stream_logging();
        client
    }

    pub fn with_endpoints(
        stream_url: impl Into<String>,
        legacy_url: impl Into<String>,
        protocol: ProtocolVersion,
        store: Arc<dyn KvStore>,
    ) -> Self {
        Self {
            http: Client::new(),
            stream_url: stream_url.into(),
            legacy_url: legacy_url.into(),
            protocol,
            log_frames: false,
            settings: Settings::new(store.clone()),
            sessions: SessionRegistry::new(store),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Send over the streaming endpoint and render the response into `sink`.
    pub async fn send<S: ChatSink + ?Sized>(
        &self,
        message: OutgoingMessage,
        sink: &mut S,
    ) -> ChatOutcome {
        let (domain, body) = match self.prepare(message, sink) {
            Ok(prepared) => prepared,
            Err(outcome) => return outcome,
        };

        let response = match self.post(&self.stream_url, &body, sink).await {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };

        let mut dispatcher = Dispatcher::new(&domain, &self.sessions, sink);
        consume_stream(
            response.bytes_stream(),
            self.protocol,
            self.log_frames,
            &mut dispatcher,
        )
        .await
    }

    /// Send over the non-streaming endpoint.
    pub async fn send_legacy<S: ChatSink + ?Sized>(
        &self,
        message: OutgoingMessage,
        sink: &mut S,
    ) -> ChatOutcome {
        let (domain, body) = match self.prepare(message, sink) {
            Ok(prepared) => prepared,
            Err(outcome) => return outcome,
        };

        let response = match self.post(&self.legacy_url, &body, sink).await {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };

        let legacy = match response.json::<LegacyResponse>().await {
            Ok(l) => l,
            Err(e) => return fail(sink, Error::Protocol(format!("Malformed response: {}", e))),
        };

        let mut dispatcher = Dispatcher::new(&domain, &self.sessions, sink);
        dispatcher
            .dispatch(StreamEvent::Result {
                text: legacy.response,
                session_id: legacy.session_id,
            })
            .unwrap_or(ChatOutcome::Incomplete)
    }

    /// Check configuration and build the request body. Nothing is sent when
    /// the auth token or API key is missing.
    fn prepare<S: ChatSink + ?Sized>(
        &self,
        message: OutgoingMessage,
        sink: &mut S,
    ) -> Result<(String, ChatRequestBody), ChatOutcome> {
        let credentials = self
            .settings
            .require_credentials()
            .map_err(|e| fail(sink, e))?;

        let domain = domain_of(&message.page_url);
        let session_id = self.sessions.get(&domain).unwrap_or_else(|e| {
            warn!("Could not read session for {}: {}", domain, e);
            None
        });

        info!(
            "Sending chat message for {} (session: {})",
            domain,
            session_id.as_deref().unwrap_or("new")
        );

        let body = ChatRequestBody {
            message: message.message,
            auth_token: credentials.auth_token,
            api_key: credentials.api_key,
            api_url: message.page_url,
            session_id,
            n8n_credentials: message.platform_credentials,
        };

        sink.loading(LOADING_TEXT);
        Ok((domain, body))
    }

    async fn post<S: ChatSink + ?Sized>(
        &self,
        url: &str,
        body: &ChatRequestBody,
        sink: &mut S,
    ) -> Result<Response, ChatOutcome> {
        debug!("POST {}", url);

        let response = self.http.post(url).json(body).send().await.map_err(|e| {
            fail(
                sink,
                Error::Http(format!("Could not connect to the assistant service: {}", e)),
            )
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let body = if text.trim().is_empty() {
                status.to_string()
            } else {
                text
            };
            sink.error(&body);
            return Err(ChatOutcome::Failed(Error::Status {
                status: status.as_u16(),
                body,
            }));
        }

        Ok(response)
    }
}

/// Decode and dispatch a chunk stream until a terminal event, a transport
/// error, or the end of the stream.
pub async fn consume_stream<St, B, E, S>(
    chunks: St,
    protocol: ProtocolVersion,
    log_frames: bool,
    dispatcher: &mut Dispatcher<'_, S>,
) -> ChatOutcome
where
    St: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    S: ChatSink + ?Sized,
{
    let frames = decode_frames(chunks);
    tokio::pin!(frames);

    while let Some(frame) = frames.next().await {
        let frame = match frame {
            Ok(f) => f,
            Err(e) => {
                return fail(
                    dispatcher.sink(),
                    Error::Http(format!("Stream read error: {}", e)),
                )
            }
        };

        if log_frames {
            debug!("frame: {}", frame.raw);
        }

        let event = parse_event(&frame, protocol);
        if let Some(outcome) = dispatcher.dispatch(event) {
            return outcome;
        }
    }

    dispatcher.sink().loading_finished();
    ChatOutcome::Incomplete
}

fn fail<S: ChatSink + ?Sized>(sink: &mut S, error: Error) -> ChatOutcome {
    sink.error(&error.to_string());
    ChatOutcome::Failed(error)
}
