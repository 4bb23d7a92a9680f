// HTTP client for the Maoto marketplace and assistant
//
// Decision: One client for both services; each call names its service and route
// Decision: Only connection-level failures are retried; HTTP errors surface immediately

mod assistant;
mod client;
mod marketplace;

pub use assistant::AssistantMessage;
pub use client::{ClientError, MaotoClient};
pub use marketplace::{MarketplaceResponse, RegistrationKind, Selector};
