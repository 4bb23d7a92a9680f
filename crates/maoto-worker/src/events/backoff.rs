//! Reconnect backoff policy

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::pool::duration_millis;

/// Exponential backoff with multiplicative jitter
///
/// The delay after `n` consecutive failures is
/// `min(base_delay * 2^n, max_delay)` scaled by a factor drawn uniformly
/// from `[jitter_min, jitter_max]`.
///
/// # Example
///
/// ```
/// use maoto_worker::events::BackoffPolicy;
/// use std::time::Duration;
///
/// let policy = BackoffPolicy::default().with_max_delay(Duration::from_secs(8));
///
/// assert_eq!(policy.base_delay_for(0), Duration::from_secs(1));
/// assert_eq!(policy.base_delay_for(2), Duration::from_secs(4));
/// assert_eq!(policy.base_delay_for(10), Duration::from_secs(8));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failure, before jitter
    #[serde(with = "duration_millis")]
    pub base_delay: Duration,

    /// Cap on the pre-jitter delay
    #[serde(with = "duration_millis")]
    pub max_delay: Duration,

    /// Lower bound of the jitter factor
    pub jitter_min: f64,

    /// Upper bound of the jitter factor
    pub jitter_max: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter_min: 0.5,
            jitter_max: 1.5,
        }
    }
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            ..Default::default()
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the jitter factor range; bounds are reordered if needed
    pub fn with_jitter(mut self, min: f64, max: f64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        self.jitter_min = min.max(0.0);
        self.jitter_max = max.max(0.0);
        self
    }

    /// Disable jitter (factor is always 1.0)
    pub fn without_jitter(self) -> Self {
        self.with_jitter(1.0, 1.0)
    }

    /// Delay after `failures` consecutive failures, before jitter
    pub fn base_delay_for(&self, failures: u32) -> Duration {
        let factor = 2f64.powi(failures.min(62) as i32);
        let delay = self.base_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }

    /// Jittered delay after `failures` consecutive failures
    pub fn delay_for(&self, failures: u32) -> Duration {
        let base = self.base_delay_for(failures);
        let factor = if self.jitter_max > self.jitter_min {
            rand::thread_rng().gen_range(self.jitter_min..=self.jitter_max)
        } else {
            self.jitter_min
        };
        base.mul_f64(factor)
    }
}
