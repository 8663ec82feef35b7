//! Courier routes: cached courier status of a sale, and the webhook relay.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::{CourierSnapshot, CourierWebhookPayload, QueryKey, WebhookCategory};
use persistence::repositories::SaleRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

#[derive(Debug, Serialize)]
pub struct RelayResponse {
    pub success: bool,
    pub status: u16,
}

/// GET /api/v1/sales/:sale_id/courier
///
/// Courier fields of one sale. Cached under `sale:<id>` until the realtime
/// bridge reports a status change for it.
pub async fn get_sale_courier(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> Result<Json<CourierSnapshot>, ApiError> {
    let pool = state.pool.clone();
    let snapshot = state
        .cache
        .get_or_fetch(QueryKey::sale(sale_id), || async move {
            let entity = SaleRepository::new(pool).find_courier(sale_id).await?;
            Ok::<_, ApiError>(entity.map(CourierSnapshot::from))
        })
        .await?;

    snapshot
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Sale not found".to_string()))
}

/// POST /api/v1/courier/relay
///
/// Forwards a courier payload to the configured webhook.
pub async fn relay_courier(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(payload): Json<CourierWebhookPayload>,
) -> Result<Json<RelayResponse>, ApiError> {
    payload.validate()?;

    let settings = state.settings.get(&WebhookCategory).await?;
    let status = state.relay.send(&settings, &payload).await?;

    info!(
        user_id = %auth.user_id,
        invoice_number = %payload.invoice_number,
        "Courier payload relayed"
    );

    Ok(Json(RelayResponse {
        success: true,
        status,
    }))
}
