// Error types for decoding and settings

use thiserror::Error;

use crate::events::EventKind;

/// An inbound event could not be turned into an [`AgentEvent`](crate::AgentEvent)
///
/// Decode failures affect a single message only; the subscription that
/// delivered it stays open.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Message body is not valid JSON
    #[error("malformed event JSON: {0}")]
    Json(#[source] serde_json::Error),

    /// Message is JSON but carries no `__typename`
    #[error("event has no __typename discriminator")]
    MissingDiscriminator,

    /// `__typename` names a type outside the supported event table
    #[error("unsupported event type: {0}")]
    UnknownDiscriminator(String),

    /// Discriminator is known but the payload does not match its schema
    #[error("invalid {kind} payload: {source}")]
    Payload {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Agent settings could not be loaded
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}
