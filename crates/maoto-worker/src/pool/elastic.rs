//! Elastic worker pool
//!
//! One producer task fills a shared queue, a varying number of worker tasks
//! drain it, and a monitor task resizes the pool from the queue depth.
//! Workers retire by consuming a `Task::Shutdown` sentinel, one sentinel per
//! worker. When the producer returns on its own, every worker gets a
//! sentinel behind the queued items and the pool winds down.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use super::config::PoolConfig;
use super::queue::{Task, TaskQueue};
use super::resources::ResourceMonitor;
use super::scaling::{ScaleDecision, ScaleSample, ScalingPolicy};
use crate::error::{HandlerError, PoolError};
use crate::shutdown::StopSignal;

// =============================================================================
// Handler and producer seams
// =============================================================================

/// Per-item processing function shared by all workers
pub type TaskHandler<T> =
    Arc<dyn Fn(T) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync>;

/// Wrap an async closure as a `TaskHandler`
pub fn handler_fn<T, F, Fut>(f: F) -> TaskHandler<T>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(move |item| Box::pin(f(item)))
}

/// Long-running task feeding the pool's queue
///
/// `run` must return soon after `stop` is set.
#[async_trait]
pub trait TaskSource<T: Send + 'static>: Send + 'static {
    async fn run(self: Box<Self>, queue: TaskQueue<T>, stop: StopSignal);
}

/// `TaskSource` backed by an async closure
pub struct FnSource<F>(F);

/// Wrap an async closure as a `TaskSource`
pub fn source_fn<T, F, Fut>(f: F) -> FnSource<F>
where
    T: Send + 'static,
    F: FnOnce(TaskQueue<T>, StopSignal) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    FnSource(f)
}

#[async_trait]
impl<T, F, Fut> TaskSource<T> for FnSource<F>
where
    T: Send + 'static,
    F: FnOnce(TaskQueue<T>, StopSignal) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn run(self: Box<Self>, queue: TaskQueue<T>, stop: StopSignal) {
        (self.0)(queue, stop).await
    }
}

// =============================================================================
// State
// =============================================================================

/// Point-in-time view of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub queue_depth: usize,
    pub live_workers: usize,
    pub pending_retirements: usize,
    pub total_completed: u64,
    pub total_errors: u64,
    pub sentinels_sent: usize,
}

/// A running worker in the registry
struct WorkerHandle {
    id: u64,
    join: JoinHandle<()>,
}

#[derive(Default)]
struct PoolState {
    /// Workers whose loop has not exited
    live_workers: usize,
    workers: HashMap<u64, WorkerHandle>,
    next_worker_id: u64,
    /// Sentinels enqueued and not yet consumed
    pending_retirements: usize,
    completed_since_tick: u64,
    errors_since_tick: u64,
    last_scale_down: Option<Instant>,
    total_completed: u64,
    total_errors: u64,
    sentinels_sent: usize,
    /// Set once every worker has a sentinel queued; no spawns after that
    stopping: bool,
}

struct PoolInner<T> {
    config: PoolConfig,
    policy: ScalingPolicy,
    queue: TaskQueue<T>,
    stop: StopSignal,
    handler: TaskHandler<T>,
    state: Mutex<PoolState>,
    /// Signalled whenever a worker exits
    worker_exited: Notify,
    resources: Option<ResourceMonitor>,
}

struct Lifecycle {
    producer: Option<JoinHandle<()>>,
    monitor: Option<JoinHandle<()>>,
    stopped: bool,
}

// =============================================================================
// ElasticWorkerPool
// =============================================================================

/// Self-scaling pool of tokio worker tasks
///
/// # Example
///
/// ```ignore
/// use maoto_worker::pool::{handler_fn, source_fn, ElasticWorkerPool, PoolConfig};
///
/// let pool = ElasticWorkerPool::start(
///     PoolConfig::default().with_workers(2, 1, 8),
///     source_fn(|queue, stop| async move {
///         queue.push(42).await;
///         stop.wait().await;
///     }),
///     handler_fn(|item: u32| async move {
///         println!("got {}", item);
///         Ok(())
///     }),
/// )?;
///
/// // ... later
/// pool.stop().await;
/// ```
pub struct ElasticWorkerPool<T: Send + 'static> {
    inner: Arc<PoolInner<T>>,
    lifecycle: tokio::sync::Mutex<Lifecycle>,
}

impl<T: Send + 'static> ElasticWorkerPool<T> {
    /// Validate `config` and spawn workers, producer and monitor
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<S>(
        config: PoolConfig,
        producer: S,
        handler: TaskHandler<T>,
    ) -> Result<Self, PoolError>
    where
        S: TaskSource<T>,
    {
        Self::start_with_signal(config, StopSignal::new(), producer, handler)
    }

    /// Same as `start`, stopping when the given signal is set
    #[instrument(
        skip_all,
        fields(
            initial = config.initial_workers,
            min = config.min_workers,
            max = config.max_workers,
        )
    )]
    pub fn start_with_signal<S>(
        config: PoolConfig,
        stop: StopSignal,
        producer: S,
        handler: TaskHandler<T>,
    ) -> Result<Self, PoolError>
    where
        S: TaskSource<T>,
    {
        config.validate()?;

        let initial = config.clamped_initial_workers();
        if initial != config.initial_workers {
            warn!(
                requested = config.initial_workers,
                initial, "initial_workers outside [min_workers, max_workers], clamped"
            );
        }

        let inner = Arc::new(PoolInner {
            policy: ScalingPolicy::from(&config),
            queue: TaskQueue::with_capacity(config.queue_capacity),
            resources: config.system_metrics.then(ResourceMonitor::new),
            config,
            stop,
            handler,
            state: Mutex::new(PoolState::default()),
            worker_exited: Notify::new(),
        });

        {
            let mut state = inner.state.lock();
            for _ in 0..initial {
                spawn_worker(&inner, &mut state);
            }
        }

        let producer = tokio::spawn(run_producer(Arc::clone(&inner), Box::new(producer)));
        let monitor = tokio::spawn(run_monitor(Arc::clone(&inner)));

        info!(workers = initial, "Worker pool started");

        Ok(Self {
            inner,
            lifecycle: tokio::sync::Mutex::new(Lifecycle {
                producer: Some(producer),
                monitor: Some(monitor),
                stopped: false,
            }),
        })
    }

    /// Stop the pool and wait for producer, workers and monitor to exit
    ///
    /// Items already queued are processed first. Safe to call repeatedly
    /// and from any task; later calls return once the first one finished.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.stopped {
            debug!("Worker pool already stopped");
            return;
        }

        info!("Stopping worker pool");
        self.inner.stop.set();

        if let Some(mut producer) = lifecycle.producer.take() {
            match tokio::time::timeout(self.inner.config.producer_grace, &mut producer).await {
                Ok(Ok(())) => debug!("Producer exited"),
                Ok(Err(e)) => warn!(error = %e, "Producer task failed"),
                Err(_) => {
                    warn!(
                        grace_ms = self.inner.config.producer_grace.as_millis() as u64,
                        "Producer did not exit within grace period, aborting"
                    );
                    producer.abort();
                    let _ = producer.await;
                }
            }
        }

        let (sentinels, workers) = {
            let mut state = self.inner.state.lock();
            let sentinels = retire_all(&self.inner, &mut state);
            let workers: Vec<WorkerHandle> = state.workers.drain().map(|(_, w)| w).collect();
            (sentinels, workers)
        };
        debug!(sentinels, workers = workers.len(), "Waiting for workers to drain");

        for worker in workers {
            if let Err(e) = worker.join.await {
                error!(worker_id = worker.id, error = %e, "Worker task failed");
            }
        }

        if let Some(monitor) = lifecycle.monitor.take() {
            if let Err(e) = monitor.await {
                error!(error = %e, "Monitor task failed");
            }
        }

        lifecycle.stopped = true;
        let stats = self.stats();
        info!(
            total_completed = stats.total_completed,
            total_errors = stats.total_errors,
            "Worker pool terminated gracefully"
        );
    }

    /// Resolve once no worker is running
    ///
    /// Returns after `stop`, or after the producer finished by itself and
    /// the workers drained the queue.
    pub async fn wait_for_completion(&self) {
        loop {
            let exited = self.inner.worker_exited.notified();
            tokio::pin!(exited);
            exited.as_mut().enable();

            if self.inner.state.lock().live_workers == 0 {
                return;
            }
            exited.await;
        }
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        PoolStats {
            queue_depth: self.inner.queue.len(),
            live_workers: state.live_workers,
            pending_retirements: state.pending_retirements,
            total_completed: state.total_completed,
            total_errors: state.total_errors,
            sentinels_sent: state.sentinels_sent,
        }
    }

    /// The queue workers drain
    pub fn queue(&self) -> &TaskQueue<T> {
        &self.inner.queue
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.inner.stop
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    #[cfg(test)]
    fn tick(&self, now: Instant) -> ScaleDecision {
        monitor_tick(&self.inner, now)
    }
}

// =============================================================================
// Producer
// =============================================================================

async fn run_producer<T, S>(inner: Arc<PoolInner<T>>, producer: Box<S>)
where
    T: Send + 'static,
    S: TaskSource<T>,
{
    let finished = AssertUnwindSafe(producer.run(inner.queue.clone(), inner.stop.clone()))
        .catch_unwind()
        .await;
    if let Err(panic) = finished {
        error!(error = %panic_message(&*panic), "Producer panicked");
    }

    // stop() drains the workers itself
    if inner.stop.is_set() {
        return;
    }

    let sentinels = {
        let mut state = inner.state.lock();
        retire_all(&inner, &mut state)
    };
    info!(sentinels, "Producer finished, draining workers");
}

/// Mark the pool stopping and queue a sentinel for every worker not already
/// retiring. Caller holds the state lock. Returns the number queued.
fn retire_all<T: Send + 'static>(inner: &PoolInner<T>, state: &mut PoolState) -> usize {
    state.stopping = true;
    let sentinels = state
        .live_workers
        .saturating_sub(state.pending_retirements);
    for _ in 0..sentinels {
        inner.queue.push_sentinel();
    }
    state.pending_retirements += sentinels;
    state.sentinels_sent += sentinels;
    sentinels
}

// =============================================================================
// Workers
// =============================================================================

/// Spawn one worker and register it. Caller holds the state lock.
fn spawn_worker<T: Send + 'static>(inner: &Arc<PoolInner<T>>, state: &mut PoolState) {
    let id = state.next_worker_id;
    state.next_worker_id += 1;

    let join = tokio::spawn(run_worker(Arc::clone(inner), id));
    state.workers.insert(id, WorkerHandle { id, join });
    state.live_workers += 1;
}

async fn run_worker<T: Send + 'static>(inner: Arc<PoolInner<T>>, id: u64) {
    debug!(worker_id = id, "Worker started");

    loop {
        // Sentinels are queued once stopping is set, so an empty queue here
        // means this worker's sentinel went elsewhere
        if inner.stop.is_set() && inner.state.lock().stopping && inner.queue.is_empty() {
            debug!(worker_id = id, "Queue drained after stop, worker exiting");
            break;
        }

        let item = match inner.queue.pop_timeout(inner.config.poll_timeout).await {
            None => continue,
            Some(Task::Shutdown) => {
                let mut state = inner.state.lock();
                state.pending_retirements = state.pending_retirements.saturating_sub(1);
                drop(state);
                debug!(worker_id = id, "Worker retiring");
                break;
            }
            Some(Task::Payload(item)) => item,
        };

        let handler = Arc::clone(&inner.handler);
        let outcome = AssertUnwindSafe(async move { handler(item).await })
            .catch_unwind()
            .await;

        let failure = {
            let mut state = inner.state.lock();
            match outcome {
                Ok(Ok(())) => {
                    state.completed_since_tick += 1;
                    state.total_completed += 1;
                    None
                }
                Ok(Err(e)) => {
                    state.errors_since_tick += 1;
                    state.total_errors += 1;
                    Some(e.to_string())
                }
                Err(panic) => {
                    state.errors_since_tick += 1;
                    state.total_errors += 1;
                    Some(format!("handler panicked: {}", panic_message(&*panic)))
                }
            }
        };
        if let Some(error) = failure {
            warn!(worker_id = id, error = %error, "Task failed");
        }
    }

    {
        let mut state = inner.state.lock();
        state.workers.remove(&id);
        state.live_workers = state.live_workers.saturating_sub(1);
    }
    inner.worker_exited.notify_waiters();
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

// =============================================================================
// Monitor
// =============================================================================

async fn run_monitor<T: Send + 'static>(inner: Arc<PoolInner<T>>) {
    let period = inner.config.monitor_interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let tick = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    monitor_tick(&inner, Instant::now())
                }));
                if let Err(panic) = tick {
                    error!(error = %panic_message(&*panic), "Monitor tick failed");
                }
            }
            _ = inner.stop.wait() => {
                debug!("Monitor: stop requested");
                break;
            }
        }
    }

    debug!("Monitor exited");
}

/// Sample, decide, act and log one monitor tick
fn monitor_tick<T: Send + 'static>(inner: &Arc<PoolInner<T>>, now: Instant) -> ScaleDecision {
    let (sample, decision, completed, errors) = {
        let mut state = inner.state.lock();
        let sample = ScaleSample {
            queue_depth: inner.queue.len(),
            live_workers: state.live_workers,
            pending_retirements: state.pending_retirements,
        };

        let decision = if state.stopping || inner.stop.is_set() {
            ScaleDecision::Hold
        } else {
            inner.policy.decide(sample, state.last_scale_down, now)
        };

        match decision {
            ScaleDecision::Up(additional) => {
                for _ in 0..additional {
                    spawn_worker(inner, &mut state);
                }
            }
            ScaleDecision::Down => {
                inner.queue.push_sentinel();
                state.pending_retirements += 1;
                state.sentinels_sent += 1;
                state.last_scale_down = Some(now);
            }
            ScaleDecision::Hold => {}
        }

        let completed = std::mem::take(&mut state.completed_since_tick);
        let errors = std::mem::take(&mut state.errors_since_tick);
        (sample, decision, completed, errors)
    };

    match decision {
        ScaleDecision::Up(additional) => info!(
            queue_depth = sample.queue_depth,
            live_workers = sample.live_workers,
            additional,
            "Scaling up"
        ),
        ScaleDecision::Down => info!(
            queue_depth = sample.queue_depth,
            live_workers = sample.live_workers,
            "Scaling down by one worker"
        ),
        ScaleDecision::Hold => {}
    }

    info!(
        queue_depth = sample.queue_depth,
        live_workers = sample.live_workers,
        "Pool tick, completed: {}, errors: {} since last tick",
        completed,
        errors
    );

    if let Some(resources) = &inner.resources {
        let snapshot = resources.sample();
        info!(
            cpu_percent = snapshot.cpu_percent,
            memory_rss_mb = snapshot.memory_rss_mb,
            "Process resources"
        );
    }

    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    fn idle_source() -> impl TaskSource<u32> {
        source_fn(|_queue: TaskQueue<u32>, stop: StopSignal| async move { stop.wait().await })
    }

    fn fast_config() -> PoolConfig {
        PoolConfig::default()
            .with_poll_timeout(Duration::from_millis(20))
            // Ticks are driven by the tests
            .with_monitor_interval(Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_config() {
        let result = ElasticWorkerPool::start(
            fast_config().with_workers(1, 3, 2),
            idle_source(),
            handler_fn(|_: u32| async { Ok(()) }),
        );

        match result {
            Err(PoolError::Config(ConfigError::MinExceedsMax { min: 3, max: 2 })) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("pool should not start"),
        }
    }

    #[tokio::test]
    async fn test_initial_workers_clamped_to_max() {
        let pool = ElasticWorkerPool::start(
            fast_config().with_workers(12, 1, 3),
            idle_source(),
            handler_fn(|_: u32| async { Ok(()) }),
        )
        .unwrap();

        assert_eq!(pool.stats().live_workers, 3);
        pool.stop().await;
    }

    #[tokio::test]
    async fn test_items_processed_and_stop_is_idempotent() {
        let processed = Arc::new(AtomicUsize::new(0));
        let counter = processed.clone();

        let pool = ElasticWorkerPool::start(
            fast_config().with_workers(2, 1, 4),
            idle_source(),
            handler_fn(move |_: u32| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        )
        .unwrap();

        for i in 0..10 {
            pool.queue().push(i).await;
        }

        pool.stop().await;
        assert_eq!(processed.load(Ordering::SeqCst), 10);

        let stats = pool.stats();
        assert_eq!(stats.live_workers, 0);
        assert_eq!(stats.total_completed, 10);

        tokio::time::timeout(Duration::from_millis(100), pool.stop())
            .await
            .expect("second stop should return immediately");
        assert_eq!(pool.stats().sentinels_sent, stats.sentinels_sent);
    }

    #[tokio::test]
    async fn test_handler_panic_counts_as_error() {
        let pool = ElasticWorkerPool::start(
            fast_config().with_workers(1, 1, 1),
            idle_source(),
            handler_fn(|item: u32| async move {
                if item == 1 {
                    panic!("boom");
                }
                Ok(())
            }),
        )
        .unwrap();

        for i in 0..3 {
            pool.queue().push(i).await;
        }
        pool.stop().await;

        let stats = pool.stats();
        assert_eq!(stats.total_errors, 1);
        assert_eq!(stats.total_completed, 2);
    }

    #[tokio::test]
    async fn test_tick_scales_up_within_ceiling() {
        let gate = Arc::new(Semaphore::new(0));
        let handler_gate = gate.clone();

        let pool = ElasticWorkerPool::start(
            fast_config().with_workers(1, 1, 4).with_scale_threshold(5),
            idle_source(),
            handler_fn(move |_: u32| {
                let gate = handler_gate.clone();
                async move {
                    match gate.acquire().await {
                        Ok(_permit) => Ok(()),
                        Err(e) => Err(HandlerError::failed(e.to_string())),
                    }
                }
            }),
        )
        .unwrap();

        for i in 0..30 {
            pool.queue().push(i).await;
        }

        // Backlog of at least 24 asks for 7 more workers; headroom is 3
        assert_eq!(pool.tick(Instant::now()), ScaleDecision::Up(3));
        assert_eq!(pool.stats().live_workers, 4);
        assert_eq!(pool.tick(Instant::now()), ScaleDecision::Hold);

        gate.add_permits(1000);
        pool.stop().await;
        assert_eq!(pool.stats().total_completed, 30);
    }

    #[tokio::test]
    async fn test_tick_scale_down_counts_pending_retirements() {
        let pool = ElasticWorkerPool::start(
            fast_config()
                .with_workers(3, 2, 5)
                .with_scale_down_delay(Duration::ZERO),
            idle_source(),
            handler_fn(|_: u32| async { Ok(()) }),
        )
        .unwrap();

        // Two ticks before any worker picks up the sentinel: only one may retire
        let now = Instant::now();
        assert_eq!(pool.tick(now), ScaleDecision::Down);
        assert_eq!(pool.tick(now + Duration::from_millis(1)), ScaleDecision::Hold);

        tokio::time::timeout(Duration::from_secs(2), async {
            while pool.stats().live_workers > 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(pool.stats().pending_retirements, 0);
        assert_eq!(pool.stats().live_workers, 2);

        pool.stop().await;
        let stats = pool.stats();
        assert_eq!(stats.live_workers, 0);
        // One scale-down sentinel plus one per remaining worker
        assert_eq!(stats.sentinels_sent, 3);
    }

    #[tokio::test]
    async fn test_scale_down_throttled() {
        let pool = ElasticWorkerPool::start(
            fast_config()
                .with_workers(4, 1, 5)
                .with_scale_down_delay(Duration::from_secs(30)),
            idle_source(),
            handler_fn(|_: u32| async { Ok(()) }),
        )
        .unwrap();

        let now = Instant::now();
        assert_eq!(pool.tick(now), ScaleDecision::Down);
        assert_eq!(pool.tick(now + Duration::from_secs(5)), ScaleDecision::Hold);
        assert_eq!(pool.tick(now + Duration::from_secs(31)), ScaleDecision::Down);

        pool.stop().await;
    }

    #[tokio::test]
    async fn test_wait_for_completion_after_stop() {
        let pool = Arc::new(
            ElasticWorkerPool::start(
                fast_config().with_workers(3, 1, 3),
                idle_source(),
                handler_fn(|_: u32| async { Ok(()) }),
            )
            .unwrap(),
        );

        let waiter = tokio::spawn({
            let pool = pool.clone();
            async move { pool.wait_for_completion().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        pool.stop().await;
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_finished_producer_blocks_further_scale_up() {
        let pool = ElasticWorkerPool::start(
            fast_config().with_workers(2, 1, 6).with_scale_threshold(5),
            source_fn(|_queue: TaskQueue<u32>, _stop: StopSignal| async {}),
            handler_fn(|_: u32| async { Ok(()) }),
        )
        .unwrap();

        tokio::time::timeout(Duration::from_secs(2), pool.wait_for_completion())
            .await
            .expect("workers should retire once the producer is done");
        let stats = pool.stats();
        assert_eq!(stats.sentinels_sent, 2);
        assert_eq!(stats.pending_retirements, 0);

        // A backlog after the drain started no longer spawns workers
        for i in 0..30 {
            pool.queue().push(i).await;
        }
        assert_eq!(pool.tick(Instant::now()), ScaleDecision::Hold);
        assert_eq!(pool.stats().live_workers, 0);

        tokio::time::timeout(Duration::from_secs(1), pool.stop())
            .await
            .expect("stop after a drained pool should return");
        assert_eq!(pool.stats().sentinels_sent, 2);
    }

    #[tokio::test]
    async fn test_producer_panic_still_drains_workers() {
        let pool = ElasticWorkerPool::start(
            fast_config().with_workers(1, 1, 2),
            source_fn(|queue: TaskQueue<u32>, _stop: StopSignal| async move {
                queue.push(1).await;
                panic!("producer failed");
            }),
            handler_fn(|_: u32| async { Ok(()) }),
        )
        .unwrap();

        tokio::time::timeout(Duration::from_secs(2), pool.wait_for_completion())
            .await
            .expect("pool should drain after the producer panicked");
        assert_eq!(pool.stats().total_completed, 1);
        pool.stop().await;
    }

    #[tokio::test]
    async fn test_stuck_producer_is_aborted_after_grace() {
        let pool = ElasticWorkerPool::start(
            fast_config()
                .with_workers(1, 1, 1)
                .with_producer_grace(Duration::from_millis(50)),
            source_fn(|_queue: TaskQueue<u32>, _stop: StopSignal| async move {
                std::future::pending::<()>().await
            }),
            handler_fn(|_: u32| async { Ok(()) }),
        )
        .unwrap();

        tokio::time::timeout(Duration::from_secs(2), pool.stop())
            .await
            .expect("stop should not hang on a stuck producer");
        assert_eq!(pool.stats().live_workers, 0);
    }
}
