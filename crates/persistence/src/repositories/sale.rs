//! Repository for the courier fields of sales.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::SaleCourierEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct SaleRepository {
    pool: PgPool,
}

impl SaleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_courier(&self, sale_id: Uuid) -> Result<Option<SaleCourierEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_sale_courier", "sales");
        let result = sqlx::query_as::<_, SaleCourierEntity>(
            r#"
            SELECT id, invoice_number, customer_name, courier_status, consignment_id, updated_at
            FROM sales
            WHERE id = $1
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }
}
