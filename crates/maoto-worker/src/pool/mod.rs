//! Self-scaling worker pool
//!
//! - `queue`: MPMC hand-off carrying payloads and shutdown sentinels
//! - `scaling`: pure scale up / scale down decisions from queue depth
//! - `elastic`: the pool itself (workers, producer, monitor, graceful stop)

mod config;
mod elastic;
mod queue;
mod resources;
mod scaling;

pub use config::PoolConfig;
pub use elastic::{
    handler_fn, source_fn, ElasticWorkerPool, FnSource, PoolStats, TaskHandler, TaskSource,
};
pub use queue::{Task, TaskQueue};
pub use resources::{ResourceMonitor, ResourceSnapshot};
pub use scaling::{scale_up_amount, ScaleDecision, ScaleSample, ScalingPolicy};

pub(crate) use config::duration_millis;
