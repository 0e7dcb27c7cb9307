//! Assistant chat client.
//!
//! Sends a message to the assistant service and consumes its line-framed
//! response stream: frames are decoded across partial reads, classified into
//! [`StreamEvent`]s, and dispatched to a [`ChatSink`] in arrival order. A
//! result carrying a session id is remembered per domain so the next send
//! continues the same conversation. Free-text feedback goes through
//! [`FeedbackClient`].

pub mod client;
pub mod decoder;
pub mod dispatch;
pub mod events;
pub mod feedback;

pub use client::{ChatClient, ChatRequestBody, OutgoingMessage};
pub use decoder::{decode_frames, FrameDecoder, StreamFrame, FRAME_PREFIX};
pub use dispatch::{ChatOutcome, ChatSink, Dispatcher, PostCompletion};
pub use events::{parse_event, StreamEvent};
pub use feedback::{FeedbackClient, FeedbackReceipt, FeedbackRequest};
