// Personal assistant DTOs
// Messages between the assistant backend and the UI-facing agent, keyed by `ui_id`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Text the assistant wants shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaUserMessage {
    pub ui_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaPaymentRequest {
    pub ui_id: String,
    pub payment_link: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaLocationRequest {
    pub ui_id: String,
}

/// Asks the user to log in before an action with a cost attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaLinkUrl {
    pub ui_id: Uuid,
    pub text: String,
    pub url: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaLocationResponse {
    pub ui_id: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaUserResponse {
    pub ui_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaNewConversation {
    pub ui_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaSupportRequest {
    pub ui_id: String,
    pub text: String,
}

/// Referral code bound to a callable offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRefCode {
    pub value: String,
    pub offercallable_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefCode {
    pub id: Uuid,
    pub value: String,
    pub offercallable_id: Uuid,
    pub apikey_id: Uuid,
    pub time: DateTime<Utc>,
}
