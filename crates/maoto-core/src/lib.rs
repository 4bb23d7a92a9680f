// Data models for the Maoto agent SDK
// Marketplace and assistant DTOs, typed push events, and agent settings

pub mod api_key;
pub mod assistant;
pub mod error;
pub mod events;
pub mod intent;
pub mod offer;
pub mod settings;

mod lenient;

pub use api_key::*;
pub use assistant::*;
pub use error::{DecodeError, SettingsError};
pub use events::{AgentEvent, EventKind};
pub use intent::*;
pub use offer::*;
pub use settings::{AgentSettings, SecretString};
