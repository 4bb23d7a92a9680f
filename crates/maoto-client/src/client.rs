// HTTP client wrapper for the Maoto APIs

use std::time::Duration;

use maoto_core::{AgentSettings, SecretString, SettingsError};
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// SDK version sent with every request
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

pub(crate) const NO_BODY: Option<&()> = None;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("invalid route {route}: {source}")]
    Route {
        route: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Service {
    Marketplace,
    Assistant,
}

/// Client for the marketplace and assistant REST APIs
pub struct MaotoClient {
    http: reqwest::Client,
    url_mp: Url,
    url_pa: Url,
    apikey: SecretString,
    agent_url: Option<String>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl MaotoClient {
    pub fn new(settings: &AgentSettings) -> Result<Self, ClientError> {
        Ok(Self {
            http: reqwest::Client::new(),
            url_mp: settings.url_mp()?,
            url_pa: settings.url_pa()?,
            apikey: settings.apikey.clone(),
            agent_url: settings.agent_url.clone(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Set how many times a request is attempted when the connection fails
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the pause between connection retries
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub(crate) fn agent_url(&self) -> Option<&str> {
        self.agent_url.as_deref()
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        service: Service,
        route: &str,
    ) -> Result<T, ClientError> {
        let response = self.send(Method::GET, service, route, NO_BODY, &[]).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn get_text(&self, service: Service, route: &str) -> Result<String, ClientError> {
        let response = self.send(Method::GET, service, route, NO_BODY, &[]).await?;
        Ok(response.text().await?)
    }

    pub(crate) async fn post_json<B, T>(
        &self,
        service: Service,
        route: &str,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send(Method::POST, service, route, Some(body), &[])
            .await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn post_text<B>(
        &self,
        service: Service,
        route: &str,
        body: &B,
    ) -> Result<String, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .send(Method::POST, service, route, Some(body), &[])
            .await?;
        Ok(response.text().await?)
    }

    /// Send a request and check its status; connection failures are retried
    pub(crate) async fn send<B>(
        &self,
        method: Method,
        service: Service,
        route: &str,
        body: Option<&B>,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let base = match service {
            Service::Marketplace => &self.url_mp,
            Service::Assistant => &self.url_pa,
        };
        let url = base.join(route).map_err(|source| ClientError::Route {
            route: route.to_string(),
            source,
        })?;

        let mut attempt = 1;
        let response = loop {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .header(AUTHORIZATION, self.apikey.expose())
                .header("Version", VERSION);
            if let Some(body) = body {
                request = request.json(body);
            }
            if !query.is_empty() {
                request = request.query(query);
            }

            match request.send().await {
                Ok(response) => break response,
                Err(e) if is_connection_error(&e) && attempt < self.max_attempts => {
                    warn!(%url, attempt, error = %e, "Connection failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(ClientError::Http(e)),
            }
        };

        let status = response.status();
        debug!(%method, %url, status = status.as_u16(), "Request completed");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                detail: extract_detail(&body),
            });
        }

        Ok(response)
    }
}

fn is_connection_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout()
}

/// Prefer the `detail` field of a JSON error body, then the raw text
fn extract_detail(body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(body) {
        match map.get("detail") {
            Some(serde_json::Value::String(detail)) if !detail.is_empty() => {
                return detail.clone()
            }
            Some(serde_json::Value::Null) | None => {}
            Some(other) => return other.to_string(),
        }
    }

    if body.is_empty() {
        "<no response body>".to_string()
    } else {
        body.to_string()
    }
}
