//! Sale courier entity (database row mapping).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::CourierSnapshot;

/// Courier-related columns of a `sales` row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SaleCourierEntity {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_name: String,
    pub courier_status: Option<String>,
    pub consignment_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<SaleCourierEntity> for CourierSnapshot {
    fn from(entity: SaleCourierEntity) -> Self {
        Self {
            id: Some(entity.id),
            invoice_number: Some(entity.invoice_number),
            customer_name: Some(entity.customer_name),
            courier_status: entity.courier_status,
            consignment_id: entity.consignment_id,
        }
    }
}
