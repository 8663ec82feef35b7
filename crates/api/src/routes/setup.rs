//! First-time setup detection.

use axum::{extract::State, Json};
use serde::Serialize;

use persistence::repositories::UserRepository;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct SetupStatusResponse {
    /// No admin account exists yet.
    pub is_first_time: bool,
    /// The check was skipped by configuration.
    pub bypassed: bool,
}

/// GET /api/v1/setup/status
pub async fn setup_status(
    State(state): State<AppState>,
) -> Result<Json<SetupStatusResponse>, ApiError> {
    if state.config.setup.bypass_first_time_check {
        tracing::warn!("First-time setup check bypassed by configuration");
        return Ok(Json(SetupStatusResponse {
            is_first_time: false,
            bypassed: true,
        }));
    }

    let admin_exists = UserRepository::new(state.pool.clone()).admin_exists().await?;

    Ok(Json(SetupStatusResponse {
        is_first_time: !admin_exists,
        bypassed: false,
    }))
}
