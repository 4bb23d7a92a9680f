//! Push event delivery
//!
//! A `Transport` opens subscription sessions; `ReconnectingEventSource`
//! keeps one open, decodes each message into an `AgentEvent` and feeds the
//! worker pool's queue.

mod backoff;
mod source;
mod sse;
mod transport;

pub use backoff::BackoffPolicy;
pub use source::{ConnectionAttempt, ReconnectingEventSource};
pub use sse::SseTransport;
pub use transport::{Credentials, EventSession, Transport, SDK_VERSION};
