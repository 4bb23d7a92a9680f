// Marketplace API calls

use maoto_core::{
    ApiKey, Intent, NewIntent, NewOfferCall, NewOfferCallResponse, NewOfferCallableCostResponse,
    NewOfferCallable, NewOfferReference, NewOfferReferenceCostResponse, NewOfferResponse,
    NewSkill, OfferCall, OfferCallable, OfferReference, Skill,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::client::{ClientError, MaotoClient, Service, NO_BODY};

/// Kinds of objects an agent can register with the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationKind {
    Skill,
    OfferCallable,
    OfferReference,
}

impl RegistrationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationKind::Skill => "Skill",
            RegistrationKind::OfferCallable => "OfferCallable",
            RegistrationKind::OfferReference => "OfferReference",
        }
    }
}

/// Which registered object(s) to address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Id(Uuid),
    SolverId(Uuid),
}

impl Selector {
    fn query(&self) -> (&'static str, String) {
        match self {
            Selector::Id(id) => ("id", id.to_string()),
            Selector::SolverId(id) => ("solver_id", id.to_string()),
        }
    }
}

/// Answers the agent sends back for marketplace requests
#[derive(Debug, Clone)]
pub enum MarketplaceResponse {
    /// Answer to an OfferRequest
    Offer(NewOfferResponse),
    /// Status update for an OfferCall
    OfferCall(NewOfferCallResponse),
    /// Answer to an OfferCallableCostRequest
    OfferCallableCost(NewOfferCallableCostResponse),
    /// Answer to an OfferReferenceCostRequest
    OfferReferenceCost(NewOfferReferenceCostResponse),
}

impl MarketplaceResponse {
    fn route(&self) -> &'static str {
        match self {
            MarketplaceResponse::Offer(_) => "NewOfferResponse",
            MarketplaceResponse::OfferCall(_) => "NewOfferCallResponse",
            MarketplaceResponse::OfferCallableCost(_) => "NewOfferCallableCostResponse",
            MarketplaceResponse::OfferReferenceCost(_) => "NewOfferReferenceCostResponse",
        }
    }

    fn body(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            MarketplaceResponse::Offer(r) => serde_json::to_value(r),
            MarketplaceResponse::OfferCall(r) => serde_json::to_value(r),
            MarketplaceResponse::OfferCallableCost(r) => serde_json::to_value(r),
            MarketplaceResponse::OfferReferenceCost(r) => serde_json::to_value(r),
        }
    }
}

impl MaotoClient {
    /// API key the client authenticates with
    pub async fn get_own_apikey(&self) -> Result<ApiKey, ClientError> {
        self.get_json(Service::Marketplace, "get_own_apikey").await
    }

    /// Health probe of the marketplace (returns the raw status body)
    pub async fn health_marketplace(&self) -> Result<String, ClientError> {
        self.get_text(Service::Marketplace, "healthz").await
    }

    /// Send an intent for resolution
    pub async fn send_intent(&self, intent: &NewIntent) -> Result<Intent, ClientError> {
        self.post_json(Service::Marketplace, "NewIntent", intent)
            .await
    }

    pub async fn register_skill(&self, skill: &NewSkill) -> Result<Skill, ClientError> {
        self.post_json(Service::Marketplace, "registerNewSkill", skill)
            .await
    }

    pub async fn register_offer_callable(
        &self,
        offer: &NewOfferCallable,
    ) -> Result<OfferCallable, ClientError> {
        self.post_json(Service::Marketplace, "registerNewOfferCallable", offer)
            .await
    }

    pub async fn register_offer_reference(
        &self,
        offer: &NewOfferReference,
    ) -> Result<OfferReference, ClientError> {
        self.post_json(Service::Marketplace, "registerNewOfferReference", offer)
            .await
    }

    /// Make a registered object unavailable
    pub async fn unregister(
        &self,
        kind: RegistrationKind,
        selector: Selector,
    ) -> Result<(), ClientError> {
        let route = format!("unregister{}", kind.as_str());
        self.send(
            Method::POST,
            Service::Marketplace,
            &route,
            NO_BODY,
            &[selector.query()],
        )
        .await?;
        Ok(())
    }

    pub async fn get_skills(&self) -> Result<Vec<Skill>, ClientError> {
        self.get_registered(RegistrationKind::Skill).await
    }

    pub async fn get_offer_callables(&self) -> Result<Vec<OfferCallable>, ClientError> {
        self.get_registered(RegistrationKind::OfferCallable).await
    }

    pub async fn get_offer_references(&self) -> Result<Vec<OfferReference>, ClientError> {
        self.get_registered(RegistrationKind::OfferReference).await
    }

    async fn get_registered<T: DeserializeOwned>(
        &self,
        kind: RegistrationKind,
    ) -> Result<Vec<T>, ClientError> {
        let route = format!("get{}s", kind.as_str());
        self.get_json(Service::Marketplace, &route).await
    }

    /// Answer a marketplace request
    pub async fn send_response(&self, response: &MarketplaceResponse) -> Result<(), ClientError> {
        let body = response
            .body()
            .map_err(|e| ClientError::InvalidInput(e.to_string()))?;
        self.send(
            Method::POST,
            Service::Marketplace,
            response.route(),
            Some(&body),
            &[],
        )
        .await?;
        Ok(())
    }

    /// Refund an offer call after an error or cancellation
    pub async fn refund_offercall(&self, offercall_id: Uuid) -> Result<bool, ClientError> {
        self.post_json(
            Service::Marketplace,
            "refundOfferCall",
            &json!({ "id": offercall_id.to_string() }),
        )
        .await
    }

    /// Call another agent's callable offer
    pub async fn send_newoffercall(&self, call: &NewOfferCall) -> Result<OfferCall, ClientError> {
        self.post_json(Service::Marketplace, "NewOfferCall", call)
            .await
    }

    /// Set the webhook URL of this agent's API key
    ///
    /// Falls back to `MAOTO_AGENT_URL` when `url` is `None`.
    pub async fn set_webhook(&self, url: Option<&str>) -> Result<String, ClientError> {
        let url = url.or(self.agent_url()).ok_or_else(|| {
            ClientError::InvalidInput(
                "no webhook URL given and MAOTO_AGENT_URL is not set".to_string(),
            )
        })?;

        self.post_text(Service::Marketplace, "setWebhook", &json!({ "url": url }))
            .await
    }
}
