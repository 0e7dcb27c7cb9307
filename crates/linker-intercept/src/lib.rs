//! Response capture around request surfaces the caller does not own.
//!
//! An [`Interceptor`] pairs a pure URL predicate ([`TargetSignature`]) with a
//! side-effecting [`CaptureHook`]. It is composed around a pass-through call,
//! either as a [`tower::Layer`] over a fetch-style service or as a wrapper
//! around an XHR-style open/send object, so the caller always receives the
//! response it would have received without interception.

pub mod fetch;
pub mod interceptor;
pub mod payload;
pub mod signature;
pub mod transport;
pub mod xhr;

pub use fetch::{CaptureLayer, CaptureService};
pub use interceptor::{CaptureHook, Interceptor};
pub use payload::CapturePayload;
pub use signature::TargetSignature;
pub use transport::HttpTransport;
pub use xhr::{ReadyState, TappedXhr, XhrState, XhrTransport};
