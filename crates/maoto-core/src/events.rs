// Typed push events
//
// Every inbound message carries a `__typename` discriminator. The set of
// supported discriminators is closed: anything outside this table is a
// DecodeError, never a silently ignored message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assistant::{PaLinkUrl, PaLocationRequest, PaPaymentRequest, PaUserMessage};
use crate::error::DecodeError;
use crate::intent::IntentResponse;
use crate::offer::{
    LinkConfirmation, OfferCall, OfferCallResponse, OfferCallableCostRequest,
    OfferReferenceCostRequest, OfferRequest, PaymentRequest,
};

/// Name of the discriminator field in inbound messages
pub const DISCRIMINATOR: &str = "__typename";

/// An event pushed to the agent by the marketplace or the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum AgentEvent {
    OfferCall(OfferCall),
    OfferRequest(OfferRequest),
    OfferCallableCostRequest(OfferCallableCostRequest),
    OfferReferenceCostRequest(OfferReferenceCostRequest),
    IntentResponse(IntentResponse),
    OfferCallResponse(OfferCallResponse),
    PaymentRequest(PaymentRequest),
    LinkConfirmation(LinkConfirmation),
    #[serde(rename = "PAUserMessage")]
    PaUserMessage(PaUserMessage),
    #[serde(rename = "PALocationRequest")]
    PaLocationRequest(PaLocationRequest),
    #[serde(rename = "PALinkUrl")]
    PaLinkUrl(PaLinkUrl),
    #[serde(rename = "PAPaymentRequest")]
    PaPaymentRequest(PaPaymentRequest),
}

impl AgentEvent {
    /// Decode a raw JSON message
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(raw).map_err(DecodeError::Json)?;
        Self::from_value(value)
    }

    /// Decode an already parsed JSON message
    ///
    /// The discriminator is validated against [`EventKind`] before the payload
    /// is parsed, so an unknown type and a bad payload are reported apart.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let kind = match value.get(DISCRIMINATOR) {
            Some(Value::String(name)) => name
                .parse::<EventKind>()
                .map_err(|_| DecodeError::UnknownDiscriminator(name.clone()))?,
            Some(other) => return Err(DecodeError::UnknownDiscriminator(other.to_string())),
            None => return Err(DecodeError::MissingDiscriminator),
        };

        serde_json::from_value(value).map_err(|source| DecodeError::Payload { kind, source })
    }

    /// The discriminator of this event
    pub fn kind(&self) -> EventKind {
        match self {
            AgentEvent::OfferCall(_) => EventKind::OfferCall,
            AgentEvent::OfferRequest(_) => EventKind::OfferRequest,
            AgentEvent::OfferCallableCostRequest(_) => EventKind::OfferCallableCostRequest,
            AgentEvent::OfferReferenceCostRequest(_) => EventKind::OfferReferenceCostRequest,
            AgentEvent::IntentResponse(_) => EventKind::IntentResponse,
            AgentEvent::OfferCallResponse(_) => EventKind::OfferCallResponse,
            AgentEvent::PaymentRequest(_) => EventKind::PaymentRequest,
            AgentEvent::LinkConfirmation(_) => EventKind::LinkConfirmation,
            AgentEvent::PaUserMessage(_) => EventKind::PaUserMessage,
            AgentEvent::PaLocationRequest(_) => EventKind::PaLocationRequest,
            AgentEvent::PaLinkUrl(_) => EventKind::PaLinkUrl,
            AgentEvent::PaPaymentRequest(_) => EventKind::PaPaymentRequest,
        }
    }
}

/// Discriminator of an [`AgentEvent`], used for handler routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    OfferCall,
    OfferRequest,
    OfferCallableCostRequest,
    OfferReferenceCostRequest,
    IntentResponse,
    OfferCallResponse,
    PaymentRequest,
    LinkConfirmation,
    #[serde(rename = "PAUserMessage")]
    PaUserMessage,
    #[serde(rename = "PALocationRequest")]
    PaLocationRequest,
    #[serde(rename = "PALinkUrl")]
    PaLinkUrl,
    #[serde(rename = "PAPaymentRequest")]
    PaPaymentRequest,
}

impl EventKind {
    pub const ALL: [EventKind; 12] = [
        EventKind::OfferCall,
        EventKind::OfferRequest,
        EventKind::OfferCallableCostRequest,
        EventKind::OfferReferenceCostRequest,
        EventKind::IntentResponse,
        EventKind::OfferCallResponse,
        EventKind::PaymentRequest,
        EventKind::LinkConfirmation,
        EventKind::PaUserMessage,
        EventKind::PaLocationRequest,
        EventKind::PaLinkUrl,
        EventKind::PaPaymentRequest,
    ];

    /// Wire name (the `__typename` value)
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::OfferCall => "OfferCall",
            EventKind::OfferRequest => "OfferRequest",
            EventKind::OfferCallableCostRequest => "OfferCallableCostRequest",
            EventKind::OfferReferenceCostRequest => "OfferReferenceCostRequest",
            EventKind::IntentResponse => "IntentResponse",
            EventKind::OfferCallResponse => "OfferCallResponse",
            EventKind::PaymentRequest => "PaymentRequest",
            EventKind::LinkConfirmation => "LinkConfirmation",
            EventKind::PaUserMessage => "PAUserMessage",
            EventKind::PaLocationRequest => "PALocationRequest",
            EventKind::PaLinkUrl => "PALinkUrl",
            EventKind::PaPaymentRequest => "PAPaymentRequest",
        }
    }

    /// Human-readable description of what the event means
    pub fn description(&self) -> &'static str {
        match self {
            EventKind::OfferCall => "A caller invoked one of the agent's callable offers.",
            EventKind::OfferRequest => "An intent matched a skill; offers are requested.",
            EventKind::OfferCallableCostRequest => "The cost of a callable offer is requested.",
            EventKind::OfferReferenceCostRequest => "The cost of a reference offer is requested.",
            EventKind::IntentResponse => "The outcome of an intent sent by the agent.",
            EventKind::OfferCallResponse => "Status update for an offer call made by the agent.",
            EventKind::PaymentRequest => "A payment is required for an offer call.",
            EventKind::LinkConfirmation => "The user linked their UI id with a Maoto account.",
            EventKind::PaUserMessage => "A message directed to the user.",
            EventKind::PaLocationRequest => "The user's location is requested.",
            EventKind::PaLinkUrl => "The user must log in before a paid action.",
            EventKind::PaPaymentRequest => "Assistant-side payment request for the user.",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown event kind: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn offer_call_json() -> Value {
        json!({
            "__typename": "OfferCall",
            "id": Uuid::now_v7(),
            "offercallable_id": Uuid::now_v7(),
            "provider_id": null,
            "deputy_apikey_id": null,
            "args": {"city": "Tokyo"},
            "apikey_id": Uuid::now_v7(),
            "solver_id": null,
            "time": "2025-01-01T12:00:00Z"
        })
    }

    #[test]
    fn test_decode_offer_call() {
        let event = AgentEvent::decode(&offer_call_json().to_string()).unwrap();

        assert_eq!(event.kind(), EventKind::OfferCall);
        match event {
            AgentEvent::OfferCall(call) => assert_eq!(call.args["city"], "Tokyo"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_assistant_event_uses_wire_name() {
        let raw = json!({"__typename": "PAUserMessage", "ui_id": "ui-1", "text": "hi"});
        let event = AgentEvent::from_value(raw).unwrap();

        assert_eq!(event.kind(), EventKind::PaUserMessage);
        assert_eq!(
            serde_json::to_value(&event).unwrap()["__typename"],
            "PAUserMessage"
        );
    }

    #[test]
    fn test_unknown_discriminator() {
        let raw = json!({"__typename": "OfferExplosion", "id": 1});
        let err = AgentEvent::from_value(raw).unwrap_err();

        assert!(matches!(err, DecodeError::UnknownDiscriminator(ref name) if name == "OfferExplosion"));
    }

    #[test]
    fn test_missing_discriminator() {
        let err = AgentEvent::decode(r#"{"ui_id": "ui-1"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingDiscriminator));
    }

    #[test]
    fn test_malformed_json() {
        let err = AgentEvent::decode("{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn test_payload_mismatch_reports_kind() {
        let raw = json!({"__typename": "PaymentRequest", "payment_link": "https://pay"});
        let err = AgentEvent::from_value(raw).unwrap_err();

        assert!(matches!(
            err,
            DecodeError::Payload {
                kind: EventKind::PaymentRequest,
                ..
            }
        ));
    }

    #[test]
    fn test_event_kind_round_trips_through_wire_name() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert!("offercall".parse::<EventKind>().is_err());
    }
}
