use std::sync::Arc;

use anyhow::Result;
use axum::routing::get;
use axum::{extract::State, response::IntoResponse, Json, Router};
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;
use crate::scheduler::TokenScheduler;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub scheduler: Arc<TokenScheduler>,
}

/// Start one Axum server exposing `/metrics` (when enabled) and the
/// scheduler `/status` snapshot.
pub async fn start(settings_config: &SettingsConfig, scheduler: Arc<TokenScheduler>) -> Result<()> {
    let metrics = get_metrics().await;
    let state = AppState {
        metrics_state: MetricsState::new(metrics.registry.clone()),
        scheduler,
    };

    let app = Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .route("/status", get(get_status))
        .with_state(state);

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("status server listening on {bind_addr}");
    metrics.up.set(1);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.scheduler.status().await)
}
