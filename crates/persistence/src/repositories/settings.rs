//! Postgres settings store.
//!
//! Settings rows are exchanged as JSON objects. Reads use `to_jsonb` on the
//! table row; writes go through `jsonb_populate_record` so column types are
//! taken from the table definition.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use domain::models::settings::{Row, SettingsScope, SYSTEM_COLUMNS};
use domain::services::{SettingsStore, StoreError};

use crate::metrics::QueryTimer;

lazy_static! {
    static ref IDENTIFIER_REGEX: Regex = Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").unwrap();
}

const PERMISSION_DENIED: &str = "42501";

/// Maps a driver error onto the store error taxonomy.
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) => {
            let code = db.code().map(|c| c.into_owned()).unwrap_or_default();
            if code == PERMISSION_DENIED {
                StoreError::PermissionDenied(db.message().to_string())
            } else if code.starts_with("23") {
                StoreError::Constraint(db.message().to_string())
            } else {
                StoreError::Other(db.message().to_string())
            }
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(e.to_string()),
        sqlx::Error::Tls(e) => StoreError::Unavailable(e.to_string()),
        sqlx::Error::PoolTimedOut => StoreError::Unavailable("connection pool timed out".into()),
        sqlx::Error::PoolClosed => StoreError::Unavailable("connection pool closed".into()),
        sqlx::Error::ColumnDecode { source, .. } => StoreError::InvalidRow(source.to_string()),
        sqlx::Error::Decode(e) => StoreError::InvalidRow(e.to_string()),
        other => StoreError::Other(other.to_string()),
    }
}

fn check_identifier(name: &str) -> Result<&str, StoreError> {
    if IDENTIFIER_REGEX.is_match(name) {
        Ok(name)
    } else {
        Err(StoreError::InvalidRow(format!("invalid column name: {}", name)))
    }
}

fn into_row(value: Value) -> Result<Row, StoreError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::InvalidRow(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

fn writable_columns(row: &Row) -> Result<Vec<&str>, StoreError> {
    row.keys()
        .filter(|column| !SYSTEM_COLUMNS.contains(&column.as_str()))
        .map(|column| check_identifier(column))
        .collect()
}

async fn fetch_rows(
    conn: &mut PgConnection,
    scope: &SettingsScope,
    limit: Option<i64>,
) -> Result<Vec<Row>, StoreError> {
    let table = check_identifier(scope.table)?;
    let mut qb = QueryBuilder::<Postgres>::new("SELECT to_jsonb(t) FROM ");
    qb.push(table).push(" AS t");
    if let Some((column, value)) = &scope.filter {
        qb.push(" WHERE t.")
            .push(check_identifier(column)?)
            .push(" = ")
            .push_bind(value.clone());
    }
    qb.push(" ORDER BY t.created_at ASC");
    if let Some(limit) = limit {
        qb.push(" LIMIT ").push_bind(limit);
    }

    let timer = QueryTimer::new("settings_fetch", table);
    let result = qb
        .build_query_as::<(Value,)>()
        .fetch_all(&mut *conn)
        .await;
    timer.finish(&result);

    result
        .map_err(map_sqlx_error)?
        .into_iter()
        .map(|(value,)| into_row(value))
        .collect()
}

async fn find_row_id(
    conn: &mut PgConnection,
    scope: &SettingsScope,
) -> Result<Option<String>, StoreError> {
    let table = check_identifier(scope.table)?;
    let mut qb = QueryBuilder::<Postgres>::new("SELECT t.id::text FROM ");
    qb.push(table).push(" AS t");
    if let Some((column, value)) = &scope.filter {
        qb.push(" WHERE t.")
            .push(check_identifier(column)?)
            .push(" = ")
            .push_bind(value.clone());
    }
    qb.push(" ORDER BY t.created_at ASC LIMIT 1");

    let timer = QueryTimer::new("settings_find_id", table);
    let result = qb
        .build_query_as::<(String,)>()
        .fetch_optional(&mut *conn)
        .await;
    timer.finish(&result);

    Ok(result.map_err(map_sqlx_error)?.map(|(id,)| id))
}

async fn update_row(
    conn: &mut PgConnection,
    scope: &SettingsScope,
    id: &str,
    patch: Row,
) -> Result<Row, StoreError> {
    let table = check_identifier(scope.table)?;
    let columns = writable_columns(&patch)?;

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
    qb.push(table).push(" AS t SET ");
    for column in &columns {
        qb.push(*column).push(" = r.").push(*column).push(", ");
    }
    qb.push("updated_at = NOW() FROM jsonb_populate_record(NULL::")
        .push(table)
        .push(", ")
        .push_bind(Value::Object(patch.clone()))
        .push(") AS r WHERE t.id::text = ")
        .push_bind(id.to_string())
        .push(" RETURNING to_jsonb(t)");

    let timer = QueryTimer::new("settings_update", table);
    let result = qb
        .build_query_as::<(Value,)>()
        .fetch_optional(&mut *conn)
        .await;
    timer.finish(&result);

    match result.map_err(map_sqlx_error)? {
        Some((value,)) => into_row(value),
        None => Err(StoreError::NotFound),
    }
}

async fn insert_row(
    conn: &mut PgConnection,
    scope: &SettingsScope,
    mut row: Row,
) -> Result<Row, StoreError> {
    let table = check_identifier(scope.table)?;
    if let Some((column, value)) = &scope.filter {
        row.insert((*column).to_string(), Value::String(value.clone()));
    }
    let columns = writable_columns(&row)?;

    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
    qb.push(table).push(" AS t (");
    {
        let mut separated = qb.separated(", ");
        for column in &columns {
            separated.push(*column);
        }
    }
    qb.push(") SELECT ");
    {
        let mut separated = qb.separated(", ");
        for column in &columns {
            separated.push("r.").push_unseparated(*column);
        }
    }
    qb.push(" FROM jsonb_populate_record(NULL::")
        .push(table)
        .push(", ")
        .push_bind(Value::Object(row.clone()))
        .push(") AS r RETURNING to_jsonb(t)");

    let timer = QueryTimer::new("settings_insert", table);
    let result = qb
        .build_query_as::<(Value,)>()
        .fetch_one(&mut *conn)
        .await;
    timer.finish(&result);

    let (value,) = result.map_err(map_sqlx_error)?;
    into_row(value)
}

/// Settings store backed by Postgres.
#[derive(Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<Postgres>, StoreError> {
        self.pool.acquire().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn fetch(&self, scope: &SettingsScope, limit: Option<i64>) -> Result<Vec<Row>, StoreError> {
        let mut conn = self.acquire().await?;
        fetch_rows(&mut conn, scope, limit).await
    }

    async fn find_id(&self, scope: &SettingsScope) -> Result<Option<String>, StoreError> {
        let mut conn = self.acquire().await?;
        find_row_id(&mut conn, scope).await
    }

    async fn update(&self, scope: &SettingsScope, id: &str, patch: Row) -> Result<Row, StoreError> {
        let mut conn = self.acquire().await?;
        update_row(&mut conn, scope, id, patch).await
    }

    async fn insert(&self, scope: &SettingsScope, row: Row) -> Result<Row, StoreError> {
        let mut conn = self.acquire().await?;
        insert_row(&mut conn, scope, row).await
    }

    /// Check-then-write under a transaction-scoped advisory lock keyed on the
    /// scope, so concurrent writers of one category never insert twice.
    async fn upsert(
        &self,
        scope: &SettingsScope,
        patch: Row,
        insert: Row,
    ) -> Result<Row, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(scope.lock_key())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let row = match find_row_id(&mut *tx, scope).await? {
            Some(id) => update_row(&mut *tx, scope, &id, patch).await?,
            None => insert_row(&mut *tx, scope, insert).await?,
        };

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_check() {
        assert!(check_identifier("display_settings").is_ok());
        assert!(check_identifier("setting_type").is_ok());
        assert!(check_identifier("x; DROP TABLE users").is_err());
        assert!(check_identifier("Name").is_err());
        assert!(check_identifier("").is_err());
    }

    #[test]
    fn test_writable_columns_skip_system_columns() {
        let row = match json!({"id": "1", "created_at": "x", "content": "a", "is_enabled": true}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let mut columns = writable_columns(&row).unwrap();
        columns.sort();
        assert_eq!(columns, vec!["content", "is_enabled"]);
    }

    #[test]
    fn test_writable_columns_reject_bad_names() {
        let row = match json!({"content\"; --": "a"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert!(matches!(writable_columns(&row), Err(StoreError::InvalidRow(_))));
    }

    #[test]
    fn test_map_row_not_found() {
        assert_eq!(map_sqlx_error(sqlx::Error::RowNotFound), StoreError::NotFound);
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn test_into_row_rejects_scalars() {
        assert!(into_row(json!(1)).is_err());
        assert!(into_row(json!({"a": 1})).is_ok());
    }
}
