// Subscription transport seam
// Decision: The reconnect loop owns retry policy; transports only open and read sessions

use async_trait::async_trait;
use maoto_core::{AgentSettings, SecretString};

use crate::error::TransportError;

/// SDK version reported to the server on every connection attempt
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Credentials attached to each connection attempt
#[derive(Debug, Clone)]
pub struct Credentials {
    pub apikey: SecretString,
    pub version: String,
}

impl Credentials {
    pub fn new(apikey: impl Into<SecretString>) -> Self {
        Self {
            apikey: apikey.into(),
            version: SDK_VERSION.to_string(),
        }
    }

    pub fn from_settings(settings: &AgentSettings) -> Self {
        Self {
            apikey: settings.apikey.clone(),
            version: SDK_VERSION.to_string(),
        }
    }
}

/// Opens subscription sessions
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open a fresh session; credentials are sent with this attempt
    async fn open(&self, credentials: &Credentials)
        -> Result<Box<dyn EventSession>, TransportError>;
}

/// One open subscription
#[async_trait]
pub trait EventSession: Send {
    /// Next raw event payload; `Ok(None)` once the remote closed the stream
    async fn receive_next(&mut self) -> Result<Option<String>, TransportError>;

    /// Release the connection
    async fn close(&mut self);
}
