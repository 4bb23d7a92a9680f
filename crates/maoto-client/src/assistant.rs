// Assistant API calls

use maoto_core::{
    NewRefCode, PaLocationResponse, PaNewConversation, PaSupportRequest, PaUserResponse, RefCode,
};
use reqwest::Method;
use uuid::Uuid;

use crate::client::{ClientError, MaotoClient, Service, NO_BODY};

/// Messages the agent forwards to the assistant on behalf of a UI
#[derive(Debug, Clone)]
pub enum AssistantMessage {
    LocationResponse(PaLocationResponse),
    UserResponse(PaUserResponse),
    NewConversation(PaNewConversation),
    SupportRequest(PaSupportRequest),
}

impl AssistantMessage {
    fn route(&self) -> &'static str {
        match self {
            AssistantMessage::LocationResponse(_) => "PALocationResponse",
            AssistantMessage::UserResponse(_) => "PAUserResponse",
            AssistantMessage::NewConversation(_) => "PANewConversation",
            AssistantMessage::SupportRequest(_) => "PASupportRequest",
        }
    }

    fn body(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            AssistantMessage::LocationResponse(m) => serde_json::to_value(m),
            AssistantMessage::UserResponse(m) => serde_json::to_value(m),
            AssistantMessage::NewConversation(m) => serde_json::to_value(m),
            AssistantMessage::SupportRequest(m) => serde_json::to_value(m),
        }
    }
}

impl MaotoClient {
    /// Health probe of the assistant (returns the raw status body)
    pub async fn health_assistant(&self) -> Result<String, ClientError> {
        self.get_text(Service::Assistant, "healthz").await
    }

    pub async fn send_to_assistant(&self, message: &AssistantMessage) -> Result<(), ClientError> {
        let body = message
            .body()
            .map_err(|e| ClientError::InvalidInput(e.to_string()))?;
        self.send(
            Method::POST,
            Service::Assistant,
            message.route(),
            Some(&body),
            &[],
        )
        .await?;
        Ok(())
    }

    /// Referral codes owned by this agent
    pub async fn get_refcodes(&self) -> Result<Vec<RefCode>, ClientError> {
        self.get_json(Service::Assistant, "RefCodes").await
    }

    pub async fn create_refcode(&self, refcode: &NewRefCode) -> Result<(), ClientError> {
        self.send(
            Method::POST,
            Service::Assistant,
            "NewRefCode",
            Some(refcode),
            &[],
        )
        .await?;
        Ok(())
    }

    /// Delete a referral code by value, or all codes of a callable offer
    pub async fn delete_refcode(
        &self,
        value: Option<&str>,
        offercallable_id: Option<Uuid>,
    ) -> Result<(), ClientError> {
        let query = match (value, offercallable_id) {
            (Some(value), _) => ("value", value.to_string()),
            (None, Some(id)) => ("offercallable_id", id.to_string()),
            (None, None) => {
                return Err(ClientError::InvalidInput(
                    "either a refcode value or an offercallable_id is required".to_string(),
                ))
            }
        };

        self.send(Method::DELETE, Service::Assistant, "RefCode", NO_BODY, &[query])
            .await?;
        Ok(())
    }
}
