// Intent DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An intent to be resolved by the marketplace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIntent {
    pub description: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewIntent {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            provider_id: None,
            tags: Vec::new(),
        }
    }

    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// An intent as stored by the marketplace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub id: Uuid,
    pub description: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub apikey_id: Uuid,
    #[serde(default)]
    pub test: bool,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
}

/// Outcome of an intent, pushed to the agent that sent it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResponse {
    pub intent_id: Uuid,
    pub provider_id: String,
    pub description: String,
}

/// Information the marketplace still needs before an offer can be made
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingInfo {
    pub description: String,
}
