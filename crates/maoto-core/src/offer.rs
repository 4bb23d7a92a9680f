// Skill, offer and offer-call DTOs
//
// `New*` types are what an agent sends; the unprefixed types are what the
// marketplace stores and returns (with ids and timestamps).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;
use uuid::Uuid;

use crate::intent::{Intent, MissingInfo};
use crate::lenient;

/// A capability the agent can respond to with offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSkill {
    pub description: String,
    #[serde(deserialize_with = "lenient::json_object")]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub solver_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub description: String,
    #[serde(deserialize_with = "lenient::json_object")]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub solver_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub apikey_id: Uuid,
    pub time: DateTime<Utc>,
}

/// An offer the agent executes itself when called
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOfferCallable {
    #[serde(default)]
    pub solver_id: Option<Uuid>,
    pub description: String,
    #[serde(deserialize_with = "lenient::json_object")]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub followup: bool,
    #[serde(default)]
    pub cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferCallable {
    pub id: Uuid,
    #[serde(default)]
    pub solver_id: Option<Uuid>,
    pub description: String,
    #[serde(deserialize_with = "lenient::json_object")]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub followup: bool,
    #[serde(default)]
    pub cost: Option<f64>,
    pub apikey_id: Uuid,
    pub time: DateTime<Utc>,
}

/// An offer that points at an external resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOfferReference {
    #[serde(default)]
    pub solver_id: Option<Uuid>,
    pub description: String,
    #[serde(deserialize_with = "lenient::json_object")]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub followup: bool,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub url: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferReference {
    pub id: Uuid,
    #[serde(default)]
    pub solver_id: Option<Uuid>,
    pub description: String,
    #[serde(deserialize_with = "lenient::json_object")]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub followup: bool,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub url: Option<Url>,
    pub apikey_id: Uuid,
    pub time: DateTime<Utc>,
}

// =============================================================================
// Requests pushed to the agent
// =============================================================================

/// An intent matched one of the agent's skills; the agent should answer with
/// a [`NewOfferResponse`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRequest {
    pub skill_id: Uuid,
    #[serde(default)]
    pub solver_id: Option<Uuid>,
    pub intent: Intent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferCallableCostRequest {
    pub offercallable_id: Uuid,
    #[serde(default)]
    pub solver_id: Option<Uuid>,
    pub intent: Intent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferReferenceCostRequest {
    pub offerreference_id: Uuid,
    #[serde(default)]
    pub solver_id: Option<Uuid>,
    pub intent: Intent,
}

/// A caller invoked one of the agent's callable offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferCall {
    pub id: Uuid,
    pub offercallable_id: Uuid,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub deputy_apikey_id: Option<Uuid>,
    #[serde(deserialize_with = "lenient::json_object")]
    pub args: Map<String, Value>,
    pub apikey_id: Uuid,
    #[serde(default)]
    pub solver_id: Option<Uuid>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferCallResponse {
    pub id: Uuid,
    pub offercall_id: Uuid,
    pub offercallable_id: Uuid,
    pub description: String,
    pub provider_id: String,
    pub apikey_id: Uuid,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub offercall_id: Uuid,
    pub payment_link: String,
}

/// The user linked their assistant identity with a marketplace account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfirmation {
    pub pa_user_id: Uuid,
    pub apikey_id: Uuid,
}

// =============================================================================
// Responses sent by the agent
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOfferResponse {
    pub intent_id: Uuid,
    #[serde(default)]
    pub offerreference_ids: Vec<Uuid>,
    #[serde(default)]
    pub offercallable_ids: Vec<Uuid>,
    #[serde(default)]
    pub missinginfos: Vec<MissingInfo>,
    #[serde(default)]
    pub newoffercallables: Vec<NewOfferCallable>,
    #[serde(default)]
    pub newofferreferences: Vec<NewOfferReference>,
}

impl NewOfferResponse {
    /// An empty response for an intent (no offers, nothing missing)
    pub fn empty(intent_id: Uuid) -> Self {
        Self {
            intent_id,
            offerreference_ids: Vec::new(),
            offercallable_ids: Vec::new(),
            missinginfos: Vec::new(),
            newoffercallables: Vec::new(),
            newofferreferences: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOfferCallResponse {
    pub offercall_id: Uuid,
    pub offercallable_id: Uuid,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOfferCallableCostResponse {
    pub offercallable_id: Uuid,
    pub intent_id: Uuid,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOfferReferenceCostResponse {
    pub offerreference_id: Uuid,
    pub intent_id: Uuid,
    pub cost: f64,
    pub url: Url,
}

/// Invoke a callable offer of another agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOfferCall {
    pub offercallable_id: Uuid,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub deputy_apikey_id: Option<Uuid>,
    #[serde(deserialize_with = "lenient::json_object")]
    pub args: Map<String, Value>,
}
