// API key DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// API key identity as returned by the marketplace (never includes the secret)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub roles: Vec<String>,
    /// Webhook URL registered for this key
    #[serde(default)]
    pub url: Option<Url>,
    pub time: DateTime<Utc>,
}
