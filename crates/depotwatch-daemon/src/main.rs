//! Depotwatch daemon entry point.
//!
//! Wires the pipeline together and runs its two independent loops: the
//! scan loop (full catalog pass every `scan.interval_secs`) and the drain
//! loop (one notification per `delivery.interval_secs` tick). The loops
//! share only the delivery queue. Ctrl-C stops both, makes a best-effort
//! pass over whatever is still queued, and flushes tracking state.

use anyhow::{bail, Context};
use depotwatch_catalog::{CatalogLoader, CatalogRegistry};
use depotwatch_core::AppConfig;
use depotwatch_notify::{DeliveryQueue, DrainResult, NotificationSink, WebhookSink};
use depotwatch_resolver::ResolverChain;
use depotwatch_scanner::ScanOrchestrator;
use depotwatch_state::TrackingStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Attempt cap for the shutdown drain; keeps a hard-down sink from
/// blocking exit forever.
const SHUTDOWN_DRAIN_ATTEMPTS: usize = 50;

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,depotwatch=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting depotwatch v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_with_env().context("failed to load configuration")?;

    if config.delivery.webhook_url.is_empty() && !config.scan.dry_run {
        bail!("delivery.webhook_url is not configured (set it in config.toml or DEPOTWATCH_WEBHOOK_URL)");
    }

    // The catalog is a hard precondition: without it there is nothing to scan
    let loader = CatalogLoader::new(&config.catalog.path)
        .with_context(|| format!("catalog file {} unusable", config.catalog.path.display()))?;
    let registry = CatalogRegistry::load_from(&loader)
        .with_context(|| format!("failed to load catalog {}", config.catalog.path.display()))?;
    if registry.is_empty() {
        bail!(
            "catalog {} contains no valid entries",
            config.catalog.path.display()
        );
    }
    info!(
        entries = registry.len(),
        path = %config.catalog.path.display(),
        "catalog loaded"
    );

    let store = TrackingStore::open(&config.state.path)
        .with_context(|| format!("failed to open state file {}", config.state.path.display()))?;
    let store = Arc::new(Mutex::new(store));

    let chain =
        ResolverChain::from_config(&config.sources).context("failed to build resolver chain")?;

    let queue = Arc::new(DeliveryQueue::new(config.delivery.max_queue));

    let sink_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.sources.timeout_secs))
        .build()
        .context("failed to create webhook HTTP client")?;
    let sink: Arc<dyn NotificationSink> = Arc::new(WebhookSink::new(
        sink_client,
        config.delivery.webhook_url.clone(),
    ));

    let orchestrator = Arc::new(ScanOrchestrator::new(
        loader,
        registry,
        chain,
        store.clone(),
        queue.clone(),
        config.scan.clone(),
    ));

    let scan_task = tokio::spawn(scan_loop(
        orchestrator.clone(),
        Duration::from_secs(config.scan.interval_secs),
    ));
    let drain_task = tokio::spawn(drain_loop(
        queue.clone(),
        sink.clone(),
        Duration::from_secs(config.delivery.interval_secs),
        Duration::from_secs(config.delivery.cooldown_secs),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    scan_task.abort();
    drain_task.abort();

    shutdown_drain(&queue, sink.as_ref(), Duration::from_secs(config.delivery.cooldown_secs))
        .await;

    if let Err(e) = store.lock().await.flush() {
        error!(error = %e, "final tracking state flush failed");
    } else {
        info!("tracking state flushed");
    }

    info!("depotwatch stopped");
    Ok(())
}

/// Full catalog pass on startup and on every interval tick thereafter.
async fn scan_loop(orchestrator: Arc<ScanOrchestrator>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        // First tick fires immediately
        ticker.tick().await;
        orchestrator.run_cycle().await;
    }
}

/// One delivery attempt per tick; a throttle signal extends the pause.
async fn drain_loop(
    queue: Arc<DeliveryQueue>,
    sink: Arc<dyn NotificationSink>,
    interval: Duration,
    default_cooldown: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if let DrainResult::Throttled { retry_after } = queue.drain_one(sink.as_ref()).await {
            let cooldown = retry_after.unwrap_or(default_cooldown);
            warn!(cooldown_ms = cooldown.as_millis() as u64, "sink throttled, cooling down");
            tokio::time::sleep(cooldown).await;
        }
    }
}

/// Best-effort delivery of whatever is still queued at shutdown.
async fn shutdown_drain(queue: &DeliveryQueue, sink: &dyn NotificationSink, cooldown: Duration) {
    if queue.is_empty() {
        return;
    }

    info!(pending = queue.len(), "draining queue before exit");

    for _ in 0..SHUTDOWN_DRAIN_ATTEMPTS {
        match queue.drain_one(sink).await {
            DrainResult::Empty => return,
            DrainResult::Delivered | DrainResult::Discarded(_) => {}
            DrainResult::Throttled { retry_after } => {
                tokio::time::sleep(retry_after.unwrap_or(cooldown)).await;
            }
        }
    }

    if !queue.is_empty() {
        warn!(pending = queue.len(), "undelivered notifications remain at exit");
    }
}
