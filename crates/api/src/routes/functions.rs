//! Privileged functions.
//!
//! Operations the storefront cannot perform with row-level access alone:
//! stopping background imports and syncs, deleting users, and checking the
//! courier webhook configuration.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use domain::models::{
    authorize_user_deletion, AdminDeleteUserRequest, AdminDeleteUserResponse,
    CourierWebhookPayload, OperationKind, StopImportRequest, StopOperationResponse,
    StopSyncRequest, TestWebhookRequest, UserRole, WebhookCategory,
};
use persistence::repositories::{OperationLogRepository, UserRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::services::webhook_relay::apply_overrides;

#[derive(Debug, Serialize)]
pub struct TestWebhookResponse {
    pub success: bool,
    pub status: u16,
    pub message: String,
}

/// POST /functions/v1/stop-import
///
/// Marks a running import as failed. Succeeds even if nothing was running.
pub async fn stop_import(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<StopImportRequest>,
) -> Result<Json<StopOperationResponse>, ApiError> {
    stop_operation(&state, &auth, OperationKind::Import, request.import_log_id).await
}

/// POST /functions/v1/stop-sync
pub async fn stop_sync(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<StopSyncRequest>,
) -> Result<Json<StopOperationResponse>, ApiError> {
    stop_operation(&state, &auth, OperationKind::Sync, request.sync_log_id).await
}

async fn stop_operation(
    state: &AppState,
    auth: &UserAuth,
    kind: OperationKind,
    log_id: uuid::Uuid,
) -> Result<Json<StopOperationResponse>, ApiError> {
    let rows = OperationLogRepository::new(state.pool.clone())
        .stop(kind, log_id)
        .await?;

    info!(
        user_id = %auth.user_id,
        table = kind.table(),
        log_id = %log_id,
        rows_affected = rows,
        "Stop requested"
    );

    Ok(Json(StopOperationResponse::from_rows_affected(kind, rows)))
}

/// POST /functions/v1/admin-delete-user
///
/// Deletes a user account. The caller must hold the `admin` role and cannot
/// delete themselves.
pub async fn admin_delete_user(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<AdminDeleteUserRequest>,
) -> Result<Json<AdminDeleteUserResponse>, ApiError> {
    let users = UserRepository::new(state.pool.clone());

    let caller_role = users
        .find_role(auth.user_id)
        .await?
        .and_then(|role| role.parse::<UserRole>().ok());

    if let Err(denied) = authorize_user_deletion(auth.user_id, caller_role, request.user_id) {
        warn!(
            user_id = %auth.user_id,
            target_user_id = %request.user_id,
            reason = %denied,
            "User deletion denied"
        );
        return Err(denied.into());
    }

    if users.delete_user(request.user_id).await? == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!(
        user_id = %auth.user_id,
        target_user_id = %request.user_id,
        "User deleted"
    );

    Ok(Json(AdminDeleteUserResponse {
        success: true,
        message: "User deleted successfully".to_string(),
    }))
}

/// POST /functions/v1/test-webhook
///
/// Sends a sample courier payload to the stored webhook, optionally with the
/// URL or credentials overridden by the request body.
pub async fn test_webhook(
    State(state): State<AppState>,
    auth: UserAuth,
    body: Option<Json<TestWebhookRequest>>,
) -> Result<Json<TestWebhookResponse>, ApiError> {
    let overrides = body.map(|Json(request)| request).unwrap_or_default();
    overrides.validate()?;

    let stored = state.settings.get(&WebhookCategory).await?;
    let settings = apply_overrides(stored, &overrides);
    let status = state
        .relay
        .send(&settings, &CourierWebhookPayload::test_sample())
        .await?;

    info!(user_id = %auth.user_id, status, "Webhook test delivered");

    Ok(Json(TestWebhookResponse {
        success: true,
        status,
        message: format!("Webhook responded with status {}", status),
    }))
}
