// End-to-end pool scenarios with short intervals

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use maoto_core::{AgentEvent, EventKind};
use maoto_worker::events::{EventSession, Transport};
use maoto_worker::pool::TaskSource;
use maoto_worker::{
    handler_fn, source_fn, BackoffPolicy, ConfigError, Credentials, ElasticWorkerPool,
    EventRouter, HandlerError, PoolConfig, PoolError, ReconnectingEventSource, SseTransport,
    StopSignal, TaskQueue, TransportError,
};
use tokio::time::Instant;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn idle_source() -> impl TaskSource<u32> {
    source_fn(|_queue: TaskQueue<u32>, stop: StopSignal| async move { stop.wait().await })
}

fn quick_config() -> PoolConfig {
    PoolConfig::default()
        .with_poll_timeout(Duration::from_millis(20))
        .with_monitor_interval(Duration::from_secs(3600))
        .with_producer_grace(Duration::from_millis(500))
}

async fn wait_until<F>(timeout: Duration, mut condition: F)
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(timeout, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_failing_item_is_isolated() {
    let pool = ElasticWorkerPool::start(
        quick_config().with_workers(2, 1, 4),
        idle_source(),
        handler_fn(|item: u32| async move {
            if item == 3 {
                Err(HandlerError::failed("item 3 is broken"))
            } else {
                Ok(())
            }
        }),
    )
    .unwrap();

    for item in 1..=5 {
        pool.queue().push(item).await;
    }
    wait_until(Duration::from_secs(2), || {
        let stats = pool.stats();
        stats.total_completed + stats.total_errors == 5
    })
    .await;

    let stats = pool.stats();
    assert_eq!(stats.total_errors, 1);
    assert_eq!(stats.total_completed, 4);
    assert_eq!(stats.live_workers, 2);

    // Still accepting work
    pool.queue().push(6).await;
    wait_until(Duration::from_secs(2), || pool.stats().total_completed == 5).await;

    pool.stop().await;
}

#[tokio::test]
async fn test_stop_sends_one_sentinel_per_live_worker() {
    let pool = ElasticWorkerPool::start(
        quick_config().with_workers(3, 1, 6),
        idle_source(),
        handler_fn(|_: u32| async { Ok(()) }),
    )
    .unwrap();

    assert_eq!(pool.stats().live_workers, 3);
    pool.stop().await;

    let stats = pool.stats();
    assert_eq!(stats.sentinels_sent, 3);
    assert_eq!(stats.live_workers, 0);
    pool.wait_for_completion().await;
}

#[tokio::test]
async fn test_burst_grows_pool_then_settles_to_min() {
    let config = PoolConfig::default()
        .with_workers(2, 1, 5)
        .with_scale_threshold(5)
        .with_scale_down_delay(Duration::from_millis(150))
        .with_monitor_interval(Duration::from_millis(100))
        .with_poll_timeout(Duration::from_millis(20));

    let pool = Arc::new(
        ElasticWorkerPool::start(
            config,
            idle_source(),
            handler_fn(|_: u32| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(())
            }),
        )
        .unwrap(),
    );

    let peak = Arc::new(AtomicUsize::new(0));
    let sampler = tokio::spawn({
        let pool = pool.clone();
        let peak = peak.clone();
        async move {
            loop {
                peak.fetch_max(pool.stats().live_workers, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    });

    for item in 0..12 {
        pool.queue().push(item).await;
    }

    // The first tick after the burst adds workers
    wait_until(
        pool.config().monitor_interval + Duration::from_millis(150),
        || pool.stats().live_workers > 2,
    )
    .await;

    wait_until(Duration::from_secs(10), || {
        let stats = pool.stats();
        stats.total_completed == 12 && stats.live_workers == 1 && stats.pending_retirements == 0
    })
    .await;
    sampler.abort();

    assert!(
        peak.load(Ordering::SeqCst) > 2,
        "pool never grew past its initial size"
    );
    assert!(peak.load(Ordering::SeqCst) <= 5);

    // Settled at min: further ticks hold
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(pool.stats().live_workers, 1);

    pool.stop().await;
    assert_eq!(pool.stats().live_workers, 0);
}

#[tokio::test]
async fn test_finite_producer_lets_pool_complete() {
    let pool = ElasticWorkerPool::start(
        quick_config()
            .with_workers(2, 1, 4)
            .with_scale_down_delay(Duration::ZERO)
            .with_monitor_interval(Duration::from_millis(50)),
        source_fn(|queue: TaskQueue<u32>, _stop: StopSignal| async move {
            for item in 0..5 {
                queue.push(item).await;
            }
        }),
        handler_fn(|_: u32| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(())
        }),
    )
    .unwrap();

    tokio::time::timeout(Duration::from_secs(3), pool.wait_for_completion())
        .await
        .expect("pool should complete once the producer returned");

    let stats = pool.stats();
    assert_eq!(stats.total_completed, 5);
    assert_eq!(stats.live_workers, 0);
    assert_eq!(stats.pending_retirements, 0);
    assert!(!pool.stop_signal().is_set());

    tokio::time::timeout(Duration::from_secs(1), pool.stop())
        .await
        .expect("stop after completion should return");
    assert_eq!(pool.stats().sentinels_sent, stats.sentinels_sent);
}

#[tokio::test]
async fn test_invalid_bounds_rejected_before_start() {
    let started = Arc::new(AtomicUsize::new(0));
    let counter = started.clone();

    let result = ElasticWorkerPool::start(
        quick_config().with_workers(2, 4, 3),
        source_fn(move |_queue: TaskQueue<u32>, _stop: StopSignal| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
        handler_fn(|_: u32| async { Ok(()) }),
    );

    assert!(matches!(
        result,
        Err(PoolError::Config(ConfigError::MinExceedsMax { min: 4, max: 3 }))
    ));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(started.load(Ordering::SeqCst), 0);
}

/// Transport whose connection attempts never complete
struct HangingTransport;

#[async_trait::async_trait]
impl Transport for HangingTransport {
    async fn open(
        &self,
        _credentials: &Credentials,
    ) -> Result<Box<dyn EventSession>, TransportError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_stop_returns_while_producer_is_connecting() {
    let source = ReconnectingEventSource::new(
        HangingTransport,
        Credentials::new("test-key"),
        BackoffPolicy::default(),
    );

    let pool = ElasticWorkerPool::start(
        quick_config()
            .with_workers(2, 1, 2)
            .with_producer_grace(Duration::from_secs(30)),
        source,
        EventRouter::new().into_handler(),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    tokio::time::timeout(Duration::from_secs(2), pool.stop())
        .await
        .expect("stop should not wait for the connection attempt");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(pool.stats().live_workers, 0);
}

#[tokio::test]
async fn test_stop_during_slow_sse_handshake() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/mp/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("", "text/event-stream")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let url_mp = Url::parse(&format!("{}/mp/", server.uri())).unwrap();
    let source = ReconnectingEventSource::new(
        SseTransport::new(&url_mp).unwrap(),
        Credentials::new("test-key"),
        BackoffPolicy::default(),
    );

    let pool = ElasticWorkerPool::start(
        quick_config().with_workers(1, 1, 1),
        source,
        EventRouter::new().into_handler(),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    tokio::time::timeout(Duration::from_secs(2), pool.stop())
        .await
        .expect("stop should cancel the pending request");
}

#[tokio::test]
async fn test_sse_events_reach_routed_handlers() {
    let server = MockServer::start().await;

    let body = concat!(
        "data: {\"__typename\": \"PAUserMessage\", \"ui_id\": \"ui-1\", \"text\": \"one\"}\n\n",
        "data: {\"__typename\": \"NotAnEvent\"}\n\n",
        "event: PAUserMessage\n",
        "data: {\"ui_id\": \"ui-1\", \"text\": \"two\"}\n\n",
        "data: {\"__typename\": \"OfferCall\"}\n\n",
    );

    Mock::given(method("GET"))
        .and(path("/mp/events"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let url_mp = Url::parse(&format!("{}/mp/", server.uri())).unwrap();
    let source = ReconnectingEventSource::new(
        SseTransport::new(&url_mp).unwrap(),
        Credentials::new("test-key"),
        BackoffPolicy::new(Duration::from_millis(20), Duration::from_millis(100)),
    );

    let messages = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen = messages.clone();
    let router = EventRouter::new().on(EventKind::PaUserMessage, move |event: AgentEvent| {
        let seen = seen.clone();
        async move {
            if let AgentEvent::PaUserMessage(message) = event {
                seen.lock().push(message.text);
            }
            Ok(())
        }
    });

    let pool = ElasticWorkerPool::start(
        quick_config().with_workers(1, 1, 2),
        source,
        router.into_handler(),
    )
    .unwrap();

    wait_until(Duration::from_secs(3), || messages.lock().len() == 2).await;
    pool.stop().await;

    // The malformed OfferCall was dropped at decode, not handed to a worker
    assert_eq!(*messages.lock(), vec!["one".to_string(), "two".to_string()]);
    let stats = pool.stats();
    assert_eq!(stats.total_completed, 2);
    assert_eq!(stats.total_errors, 0);
}
