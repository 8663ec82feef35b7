//! Repository for import and sync operation logs.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{OperationKind, OperationStatus};

use crate::metrics::QueryTimer;

/// Repository for `import_logs` and `sync_logs`.
#[derive(Clone)]
pub struct OperationLogRepository {
    pool: PgPool,
}

impl OperationLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Marks a running operation as failed. Returns the number of rows changed,
    /// which is zero when the operation is unknown or already finished.
    pub async fn stop(&self, kind: OperationKind, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("operation_stop", kind.table());
        // Table names come from OperationKind, never from input.
        let sql = format!(
            "UPDATE {} SET status = $1, completed_at = NOW() WHERE id = $2 AND status = $3",
            kind.table()
        );
        let result = sqlx::query(&sql)
            .bind(OperationStatus::Failed.as_str())
            .bind(id)
            .bind(OperationStatus::InProgress.as_str())
            .execute(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result?.rows_affected())
    }
}
