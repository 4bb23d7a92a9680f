//! Worker pool configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Elastic worker pool configuration
///
/// # Example
///
/// ```
/// use maoto_worker::pool::PoolConfig;
/// use std::time::Duration;
///
/// let config = PoolConfig::default()
///     .with_workers(2, 1, 8)
///     .with_scale_threshold(5)
///     .with_scale_down_delay(Duration::from_secs(10));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolConfig {
    /// Workers spawned at start (clamped into [min_workers, max_workers])
    pub initial_workers: usize,

    /// Scale-down never goes below this many workers
    pub min_workers: usize,

    /// Scale-up never goes above this many workers
    pub max_workers: usize,

    /// Queue depth above which the pool grows
    pub scale_threshold: usize,

    /// Minimum time between two scale-down actions
    #[serde(with = "duration_millis")]
    pub scale_down_delay: Duration,

    /// How often the monitor samples the pool
    #[serde(with = "duration_millis")]
    pub monitor_interval: Duration,

    /// Bounded wait of a worker on an empty queue
    #[serde(with = "duration_millis")]
    pub poll_timeout: Duration,

    /// How long stop() waits for the producer before aborting it
    #[serde(with = "duration_millis")]
    pub producer_grace: Duration,

    /// Maximum queued items; producers wait for room when reached
    #[serde(default)]
    pub queue_capacity: Option<usize>,

    /// Log process CPU and memory on every monitor tick
    #[serde(default)]
    pub system_metrics: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_workers: 10,
            min_workers: 1,
            max_workers: 20,
            scale_threshold: 5,
            scale_down_delay: Duration::from_secs(30),
            monitor_interval: Duration::from_secs(5),
            poll_timeout: Duration::from_millis(500),
            producer_grace: Duration::from_secs(5),
            queue_capacity: None,
            system_metrics: false,
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set initial, minimum and maximum worker counts
    pub fn with_workers(mut self, initial: usize, min: usize, max: usize) -> Self {
        self.initial_workers = initial;
        self.min_workers = min;
        self.max_workers = max;
        self
    }

    pub fn with_scale_threshold(mut self, threshold: usize) -> Self {
        self.scale_threshold = threshold;
        self
    }

    pub fn with_scale_down_delay(mut self, delay: Duration) -> Self {
        self.scale_down_delay = delay;
        self
    }

    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_producer_grace(mut self, grace: Duration) -> Self {
        self.producer_grace = grace;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn with_system_metrics(mut self, enabled: bool) -> Self {
        self.system_metrics = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.min_workers > self.max_workers {
            return Err(ConfigError::MinExceedsMax {
                min: self.min_workers,
                max: self.max_workers,
            });
        }
        if self.scale_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.queue_capacity == Some(0) {
            return Err(ConfigError::Invalid {
                name: "queue_capacity",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// `initial_workers` clamped into the configured bounds
    pub fn clamped_initial_workers(&self) -> usize {
        self.initial_workers.clamp(self.min_workers, self.max_workers)
    }

    /// Create configuration from environment variables
    ///
    /// Unset variables keep their defaults. The result is not validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_count(&lookup, "MAOTO_INITIAL_WORKERS")? {
            config.initial_workers = v;
        }
        if let Some(v) = parse_count(&lookup, "MAOTO_MIN_WORKERS")? {
            config.min_workers = v;
        }
        if let Some(v) = parse_count(&lookup, "MAOTO_MAX_WORKERS")? {
            config.max_workers = v;
        }
        if let Some(v) = parse_count(&lookup, "MAOTO_SCALE_THRESHOLD")? {
            config.scale_threshold = v;
        }
        if let Some(v) = parse_count(&lookup, "MAOTO_SCALE_DOWN_DELAY_SECS")? {
            config.scale_down_delay = Duration::from_secs(v as u64);
        }
        if let Some(v) = parse_count(&lookup, "MAOTO_QUEUE_CAPACITY")? {
            config.queue_capacity = Some(v);
        }
        if let Some(raw) = lookup("MAOTO_SYSTEM_METRICS") {
            config.system_metrics = matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        Ok(config)
    }
}

fn parse_count<F>(lookup: &F, name: &'static str) -> Result<Option<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.starts_with('-') {
        return Err(ConfigError::Invalid {
            name,
            message: format!("count must not be negative, got {}", raw),
        });
    }
    raw.parse::<usize>()
        .map(Some)
        .map_err(|e| ConfigError::Invalid {
            name,
            message: format!("{} ({})", e, raw),
        })
}

/// Serde support for Duration as milliseconds
pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
