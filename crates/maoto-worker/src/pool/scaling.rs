//! Queue-depth driven scaling decisions
//!
//! `ScalingPolicy::decide` is pure: the monitor samples the pool under its
//! lock, asks for a decision and applies it.

use std::time::Duration;

use tokio::time::Instant;

use super::config::PoolConfig;

/// Growth factor applied to the backlog above the threshold
const SCALE_UP_FACTOR: f64 = 0.2;
/// Exponent making growth super-linear in the backlog
const SCALE_UP_EXPONENT: f64 = 1.3;

/// Pool state observed by one monitor tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleSample {
    pub queue_depth: usize,
    pub live_workers: usize,
    /// Sentinels queued by earlier scale-downs and not yet consumed
    pub pending_retirements: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDecision {
    /// Spawn this many workers
    Up(usize),
    /// Retire one worker
    Down,
    Hold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalingPolicy {
    pub min_workers: usize,
    pub max_workers: usize,
    pub scale_threshold: usize,
    pub scale_down_delay: Duration,
}

impl From<&PoolConfig> for ScalingPolicy {
    fn from(config: &PoolConfig) -> Self {
        Self {
            min_workers: config.min_workers,
            max_workers: config.max_workers,
            scale_threshold: config.scale_threshold,
            scale_down_delay: config.scale_down_delay,
        }
    }
}

impl ScalingPolicy {
    /// Decide what to do for `sample`, given when the pool last shrank
    pub fn decide(
        &self,
        sample: ScaleSample,
        last_scale_down: Option<Instant>,
        now: Instant,
    ) -> ScaleDecision {
        if sample.queue_depth > self.scale_threshold && sample.live_workers < self.max_workers {
            let headroom = self.max_workers - sample.live_workers;
            let additional = scale_up_amount(sample.queue_depth, self.scale_threshold).min(headroom);
            return if additional > 0 {
                ScaleDecision::Up(additional)
            } else {
                ScaleDecision::Hold
            };
        }

        let low_water = self.scale_threshold as f64 / 2.0;
        let effective = sample
            .live_workers
            .saturating_sub(sample.pending_retirements);
        let throttled = match last_scale_down {
            Some(at) => now.saturating_duration_since(at) <= self.scale_down_delay,
            None => false,
        };

        if (sample.queue_depth as f64) < low_water && effective > self.min_workers && !throttled {
            ScaleDecision::Down
        } else {
            ScaleDecision::Hold
        }
    }
}

/// Workers to add for a backlog, before clamping to the pool ceiling
///
/// `floor(((depth - threshold) * 0.2) ^ 1.3)`
pub fn scale_up_amount(queue_depth: usize, scale_threshold: usize) -> usize {
    let backlog = queue_depth.saturating_sub(scale_threshold) as f64;
    (backlog * SCALE_UP_FACTOR).powf(SCALE_UP_EXPONENT).floor() as usize
}
