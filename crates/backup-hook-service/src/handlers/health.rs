//! Liveness and backup-slot report.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// Always `"ok"` while the listener is up.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Scripts running right now.
    pub backups_in_flight: usize,
    /// Configured ceiling on concurrent scripts.
    pub max_concurrent_backups: usize,
}

/// `GET /health`. Unauthenticated and never touches the script.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        service: "backup-hook",
        version: env!("CARGO_PKG_VERSION"),
        backups_in_flight: state.backups_in_flight(),
        max_concurrent_backups: state.config.max_concurrent_backups,
    })
}
