use std::sync::Arc;

use prometheus::{IntCounter, IntGauge, Registry};
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Issuance metrics
    pub issuance_requests: IntCounter,
    pub issuance_failures: IntCounter,
    pub token_reuse: IntCounter,
    pub token_expiry_unix: IntGauge,

    // Scheduler metrics
    pub refresh_cycles: IntCounter,
    pub refresh_cycle_failures: IntCounter,
    pub scheduler_running: IntGauge,

    // Config/runtime
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("kistokenagent".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            issuance_requests: IntCounter::new("issuance_requests_total", "Total token issuance calls to the upstream endpoint").unwrap(),
            issuance_failures: IntCounter::new("issuance_failures_total", "Token issuance calls that failed").unwrap(),
            token_reuse: IntCounter::new("token_reuse_total", "Refresh decisions satisfied by a stored token").unwrap(),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Expiry timestamp of the last issued token").unwrap(),

            refresh_cycles: IntCounter::new("refresh_cycles_total", "Scheduler loop iterations").unwrap(),
            refresh_cycle_failures: IntCounter::new("refresh_cycle_failures_total", "Scheduler iterations that ended in error").unwrap(),
            scheduler_running: IntGauge::new("scheduler_running", "1 while the renewal loop is active").unwrap(),

            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.issuance_requests.clone())).unwrap();
        reg.register(Box::new(metrics.issuance_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_reuse.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.refresh_cycles.clone())).unwrap();
        reg.register(Box::new(metrics.refresh_cycle_failures.clone())).unwrap();
        reg.register(Box::new(metrics.scheduler_running.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
