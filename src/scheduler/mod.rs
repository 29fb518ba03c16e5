//! Background renewal loop with cooperative shutdown.
//!
//! One dedicated task wakes on the configured interval and runs the refresh
//! decision. A failed cycle never terminates the loop: it logs and waits a
//! fixed longer cooldown before the next attempt, on the assumption that
//! upstream outages are transient.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::helpers::time::Clock;
use crate::manager::TokenManager;
use crate::observability::metrics::get_metrics;

/// Default wait between scheduled checks (30 minutes).
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(1800);

/// Wait after a failed cycle before the next attempt.
pub const FAILURE_COOLDOWN: Duration = Duration::from_secs(300);

/// Bound on how long `stop()` waits for the loop task to exit.
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

struct LoopHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    interval: Duration,
}

pub struct TokenScheduler {
    manager: Arc<TokenManager>,
    clock: Arc<dyn Clock>,
    /// `Some` while a loop is running. Guarded so two loops can never run
    /// concurrently for the same scheduler.
    state: Mutex<Option<LoopHandle>>,
    last_check_at: Arc<RwLock<Option<i64>>>,
}

/// Read-only snapshot for observability. The token is exposed only as a
/// short masked prefix.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub check_interval_secs: Option<u64>,
    pub last_check_at: Option<i64>,
    pub current_token: Option<String>,
}

impl TokenScheduler {
    pub fn new(manager: Arc<TokenManager>, clock: Arc<dyn Clock>) -> Self {
        Self {
            manager,
            clock,
            state: Mutex::new(None),
            last_check_at: Arc::new(RwLock::new(None)),
        }
    }

    /// Starts the renewal loop. A second call while running is a warning,
    /// not an error, and leaves the existing loop untouched.
    pub async fn start(&self, interval: Duration) {
        let mut state = self.state.lock().await;
        if state.is_some() {
            warn!("token scheduler already running, start ignored");
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(&self.manager);
        let clock = Arc::clone(&self.clock);
        let last_check_at = Arc::clone(&self.last_check_at);
        let task = tokio::spawn(async move {
            run_loop(manager, clock, last_check_at, interval, shutdown_rx).await;
        });

        *state = Some(LoopHandle { shutdown: shutdown_tx, task, interval });
        get_metrics().await.scheduler_running.set(1);
        info!(interval_secs = interval.as_secs(), "token scheduler started");
    }

    /// Signals the loop and waits (bounded) until the task has exited, so
    /// no resources leak across a restart with a different interval.
    /// Idempotent and safe to call from any task.
    pub async fn stop(&self) {
        let handle = self.state.lock().await.take();
        let Some(handle) = handle else {
            warn!("token scheduler is not running, stop ignored");
            return;
        };

        let _ = handle.shutdown.send(true);
        if tokio::time::timeout(STOP_JOIN_TIMEOUT, handle.task).await.is_err() {
            error!("token scheduler loop did not exit within {STOP_JOIN_TIMEOUT:?}");
        }
        get_metrics().await.scheduler_running.set(0);
        info!("token scheduler stopped");
    }

    pub async fn status(&self) -> SchedulerStatus {
        let interval = self.state.lock().await.as_ref().map(|h| h.interval.as_secs());
        SchedulerStatus {
            running: interval.is_some(),
            check_interval_secs: interval,
            last_check_at: *self.last_check_at.read().await,
            current_token: self.manager.active_token().masked().await,
        }
    }
}

async fn run_loop(
    manager: Arc<TokenManager>,
    clock: Arc<dyn Clock>,
    last_check_at: Arc<RwLock<Option<i64>>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        {
            let mut guard = last_check_at.write().await;
            *guard = Some(clock.now_unix());
        }

        let metrics = get_metrics().await;
        metrics.refresh_cycles.inc();

        let wait = match manager.ensure_valid_token().await {
            Ok(_) => interval,
            Err(e) => {
                error!("scheduled token check failed: {e}");
                metrics.refresh_cycle_failures.inc();
                FAILURE_COOLDOWN
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}
