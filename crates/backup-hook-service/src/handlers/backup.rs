//! Signed backup trigger.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::Json;
use http_body_util::LengthLimitError;

use backup_hook_core::BackupResponse;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validate::{self, ValidatedRequest};

/// Message returned when the script exits successfully.
pub const SUCCESS_MESSAGE: &str = "Backup initiated successfully";

/// Handle `POST /backup`.
///
/// Every failed check answers immediately; the script only runs once the
/// signature has been verified over the raw body and the body has decoded.
/// A backup slot is held only for the script run itself.
pub async fn backup(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<BackupResponse>, ApiError> {
    let (parts, body) = request.into_parts();

    // Reject before buffering the body.
    validate::check_method(&parts.method)?;

    let body = read_body(body, state.config.max_body_bytes).await?;
    let ValidatedRequest { args, .. } =
        validate::validate(&parts.method, &parts.headers, body, &state.config.secret)?;

    tracing::info!(arg_count = args.len(), "Signature verified, running backup script");

    if state.backup_slots.available_permits() == 0 {
        tracing::debug!(
            max_concurrent_backups = state.config.max_concurrent_backups,
            "Waiting for a free backup slot"
        );
    }
    let _slot = state
        .backup_slots
        .acquire()
        .await
        .map_err(|_| ApiError::Unavailable)?;

    let result = state.runner.run(&state.config.script_path, &args).await?;
    let output = String::from_utf8_lossy(&result.output).into_owned();

    tracing::info!(
        exit_code = ?result.exit_code,
        output = %output,
        "Backup script executed successfully"
    );

    Ok(Json(BackupResponse {
        message: SUCCESS_MESSAGE.to_string(),
        output,
    }))
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        if is_length_limit(&e) {
            ApiError::PayloadTooLarge { limit }
        } else {
            ApiError::UnreadableBody(e.to_string())
        }
    })
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}
