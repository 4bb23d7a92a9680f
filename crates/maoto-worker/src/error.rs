// Error types for the worker pool and the event source

use maoto_core::EventKind;
use thiserror::Error;

/// Invalid pool configuration, reported before anything is spawned
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("min_workers ({min}) must not exceed max_workers ({max})")]
    MinExceedsMax { min: usize, max: usize },

    #[error("max_workers must be at least 1")]
    NoWorkers,

    #[error("scale_threshold must be at least 1")]
    ZeroThreshold,

    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Worker pool errors
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("invalid pool configuration: {0}")]
    Config(#[from] ConfigError),
}

/// A single item failed to process
///
/// Handler errors are counted and logged by the pool; they never stop a
/// worker.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("no handler registered for event kind: {0}")]
    Unhandled(EventKind),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn failed(msg: impl Into<String>) -> Self {
        HandlerError::Failed(msg.into())
    }
}

/// Connection-level failures of the event subscription; always retried
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("event stream rejected ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("event stream error: {0}")]
    Stream(String),

    #[error("event stream closed by remote")]
    Closed,

    #[error("invalid event stream URL: {0}")]
    Url(String),
}
