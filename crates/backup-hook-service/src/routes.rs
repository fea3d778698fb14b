//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{backup, health};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check (public)
/// - `POST /backup` - Signed backup trigger; every other method gets 405
///
/// Concurrent script runs are capped inside the handler, after the
/// signature check, not per connection.
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    // `any` so the handler answers wrong methods with a JSON 405.
    Router::new()
        .route("/health", get(health::health))
        .route("/backup", any(backup::backup))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
