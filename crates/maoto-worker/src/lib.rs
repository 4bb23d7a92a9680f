// Maoto agent worker
// Decision: One push subscription feeds one in-process queue drained by an elastic pool
// Decision: Process shutdown flows through a single StopSignal

pub mod error;
pub mod events;
pub mod pool;
pub mod router;
pub mod shutdown;

pub use error::{ConfigError, HandlerError, PoolError, TransportError};
pub use events::{BackoffPolicy, Credentials, ReconnectingEventSource, SseTransport};
pub use pool::{handler_fn, source_fn, ElasticWorkerPool, PoolConfig, PoolStats, TaskQueue};
pub use router::EventRouter;
pub use shutdown::{ShutdownCoordinator, ShutdownReason, StopSignal};
