use anyhow::{Context, Result};
use maoto_client::MaotoClient;
use maoto_core::{AgentEvent, AgentSettings, EventKind};
use maoto_worker::{
    BackoffPolicy, Credentials, ElasticWorkerPool, EventRouter, PoolConfig,
    ReconnectingEventSource, ShutdownCoordinator, SseTransport, StopSignal,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maoto_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("maoto-worker starting...");

    let settings = AgentSettings::from_env().context("Failed to load agent settings")?;
    let pool_config = PoolConfig::from_env().context("Failed to load pool configuration")?;

    let client = MaotoClient::new(&settings).context("Failed to create Maoto client")?;
    match client.health_marketplace().await {
        Ok(status) => tracing::info!(status = %status.trim(), "Marketplace reachable"),
        Err(e) => tracing::warn!(error = %e, "Marketplace health check failed"),
    }

    let transport =
        SseTransport::from_settings(&settings).context("Failed to create event transport")?;
    tracing::info!(url = %transport.url(), "Subscribing to agent events");

    let source = ReconnectingEventSource::new(
        transport,
        Credentials::from_settings(&settings),
        BackoffPolicy::default(),
    );

    // Listen for signals before anything is spawned
    let stop = StopSignal::new();
    let coordinator = ShutdownCoordinator::install(stop.clone());

    tracing::info!(
        initial = pool_config.initial_workers,
        min = pool_config.min_workers,
        max = pool_config.max_workers,
        "Starting worker pool"
    );
    let pool = ElasticWorkerPool::start_with_signal(
        pool_config,
        stop,
        source,
        logging_router().into_handler(),
    )
    .context("Failed to start worker pool")?;

    let reason = coordinator.wait().await;
    tracing::info!(reason = ?reason, "Shutting down");
    pool.stop().await;

    let code = reason.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Router that logs every supported event kind
fn logging_router() -> EventRouter {
    EventKind::ALL
        .into_iter()
        .fold(EventRouter::new(), |router, kind| {
            router.on(kind, move |event: AgentEvent| async move {
                tracing::info!(
                    kind = %event.kind(),
                    description = kind.description(),
                    "Event received"
                );
                Ok(())
            })
        })
}
