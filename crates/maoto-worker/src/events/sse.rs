// Server-sent events transport
// Decision: Events are pushed over one long-lived GET {url_mp}events response
// Decision: SSE event name stands in for a missing __typename
// Decision: A stream silent for longer than the idle timeout counts as failed

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::{Stream, StreamExt};
use maoto_core::events::DISCRIMINATOR;
use maoto_core::AgentSettings;
use reqwest::Client;
use tracing::{debug, trace};
use url::Url;

use super::transport::{Credentials, EventSession, Transport};
use crate::error::TransportError;

type SseStream = Pin<Box<dyn Stream<Item = Result<Event, EventStreamError<reqwest::Error>>> + Send>>;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// `Transport` reading agent events from the marketplace SSE endpoint
#[derive(Debug, Clone)]
pub struct SseTransport {
    http: Client,
    url: Url,
    idle_timeout: Duration,
}

impl SseTransport {
    /// Subscribe at `{url_mp}events`
    pub fn new(url_mp: &Url) -> Result<Self, TransportError> {
        Self::with_idle_timeout(url_mp, DEFAULT_IDLE_TIMEOUT)
    }

    /// Like `new`, failing a session after `idle_timeout` without any bytes
    /// (keep-alive comments included)
    pub fn with_idle_timeout(url_mp: &Url, idle_timeout: Duration) -> Result<Self, TransportError> {
        let url = url_mp
            .join("events")
            .map_err(|e| TransportError::Url(e.to_string()))?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .read_timeout(idle_timeout)
            .build()?;

        Ok(Self {
            http,
            url,
            idle_timeout,
        })
    }

    pub fn from_settings(settings: &AgentSettings) -> Result<Self, TransportError> {
        let url_mp = settings
            .url_mp()
            .map_err(|e| TransportError::Url(e.to_string()))?;
        Self::with_idle_timeout(&url_mp, settings.event_idle_timeout)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn open(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn EventSession>, TransportError> {
        debug!(url = %self.url, "Opening event stream");

        let response = self
            .http
            .get(self.url.clone())
            .header("Authorization", credentials.apikey.expose())
            .header("Version", credentials.version.as_str())
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let events: SseStream = Box::pin(response.bytes_stream().eventsource());
        Ok(Box::new(SseSession {
            events: Some(events),
        }))
    }
}

struct SseSession {
    events: Option<SseStream>,
}

#[async_trait]
impl EventSession for SseSession {
    async fn receive_next(&mut self) -> Result<Option<String>, TransportError> {
        let Some(events) = self.events.as_mut() else {
            return Ok(None);
        };

        while let Some(event) = events.next().await {
            let event = event.map_err(stream_error)?;

            // Comments and keep-alives carry no data
            if event.data.trim().is_empty() {
                trace!(event = %event.event, "Skipping empty event");
                continue;
            }

            return Ok(Some(with_discriminator(&event.event, event.data)));
        }

        Ok(None)
    }

    async fn close(&mut self) {
        self.events = None;
    }
}

fn stream_error(e: EventStreamError<reqwest::Error>) -> TransportError {
    match e {
        EventStreamError::Transport(e) if e.is_timeout() => {
            TransportError::Stream("idle timeout".to_string())
        }
        other => TransportError::Stream(other.to_string()),
    }
}

/// Fill in `__typename` from the SSE event name when the payload lacks it
fn with_discriminator(event_name: &str, data: String) -> String {
    if event_name.is_empty() || event_name == "message" {
        return data;
    }

    match serde_json::from_str::<serde_json::Value>(&data) {
        Ok(serde_json::Value::Object(mut object))
            if !object.contains_key(DISCRIMINATOR) =>
        {
            object.insert(
                DISCRIMINATOR.to_string(),
                serde_json::Value::String(event_name.to_string()),
            );
            serde_json::Value::Object(object).to_string()
        }
        _ => data,
    }
}
