//! Settings store abstraction.
//!
//! A store reads and writes raw settings rows inside a [`SettingsScope`]. The
//! Postgres implementation lives in the persistence crate; the in-memory
//! store below backs service tests and local development.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::models::settings::{Row, SettingsScope};

/// Store failures. Absence of a row is never one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Row not found")]
    NotFound,

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Store error: {0}")]
    Other(String),
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Rows in `scope`, oldest first.
    async fn fetch(&self, scope: &SettingsScope, limit: Option<i64>) -> Result<Vec<Row>, StoreError>;

    /// Id of the oldest row in `scope`, if any.
    async fn find_id(&self, scope: &SettingsScope) -> Result<Option<String>, StoreError>;

    /// Writes exactly the columns in `patch` to row `id` and returns the row.
    async fn update(&self, scope: &SettingsScope, id: &str, patch: Row) -> Result<Row, StoreError>;

    /// Inserts a new row and returns it as stored.
    async fn insert(&self, scope: &SettingsScope, row: Row) -> Result<Row, StoreError>;

    /// Updates the scope's row with `patch`, or inserts `insert_row` if the
    /// scope is empty.
    ///
    /// The default is a plain check-then-write. Stores that can serialize
    /// writers per scope override it.
    async fn upsert(
        &self,
        scope: &SettingsScope,
        patch: Row,
        insert_row: Row,
    ) -> Result<Row, StoreError> {
        match self.find_id(scope).await? {
            Some(id) => self.update(scope, &id, patch).await,
            None => self.insert(scope, insert_row).await,
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    rows: Vec<(&'static str, Row)>,
    fail_next: Option<StoreError>,
}

/// Process-local store. Each upsert holds the table lock for its whole
/// check-then-write.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    tables: Mutex<Tables>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next store call fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        self.lock().fail_next = Some(error);
    }

    /// Number of rows in `scope`.
    pub fn row_count(&self, scope: &SettingsScope) -> usize {
        self.lock()
            .rows
            .iter()
            .filter(|(table, row)| *table == scope.table && scope.matches(row))
            .count()
    }

    /// Seeds a row as if it had been written by another client.
    pub fn seed(&self, scope: &SettingsScope, row: Row) -> Row {
        let mut tables = self.lock();
        insert_locked(&mut tables, scope, row)
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(tables: &mut Tables) -> Result<(), StoreError> {
        match tables.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn now_value() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

fn find_index(tables: &Tables, scope: &SettingsScope) -> Option<usize> {
    tables
        .rows
        .iter()
        .position(|(table, row)| *table == scope.table && scope.matches(row))
}

fn insert_locked(tables: &mut Tables, scope: &SettingsScope, mut row: Row) -> Row {
    if let Some((column, value)) = &scope.filter {
        row.insert((*column).to_string(), Value::String(value.clone()));
    }
    let now = now_value();
    row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    row.insert("created_at".into(), now.clone());
    row.insert("updated_at".into(), now);
    tables.rows.push((scope.table, row.clone()));
    row
}

fn update_locked(
    tables: &mut Tables,
    scope: &SettingsScope,
    id: &str,
    patch: Row,
) -> Result<Row, StoreError> {
    let (_, row) = tables
        .rows
        .iter_mut()
        .find(|(table, row)| {
            *table == scope.table && row.get("id").and_then(Value::as_str) == Some(id)
        })
        .ok_or(StoreError::NotFound)?;
    for (column, value) in patch {
        if column != "id" && column != "created_at" {
            row.insert(column, value);
        }
    }
    row.insert("updated_at".into(), now_value());
    Ok(row.clone())
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn fetch(&self, scope: &SettingsScope, limit: Option<i64>) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.lock();
        Self::take_failure(&mut tables)?;
        let take = limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(tables
            .rows
            .iter()
            .filter(|(table, row)| *table == scope.table && scope.matches(row))
            .take(take)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn find_id(&self, scope: &SettingsScope) -> Result<Option<String>, StoreError> {
        let mut tables = self.lock();
        Self::take_failure(&mut tables)?;
        Ok(find_index(&tables, scope).and_then(|i| {
            tables.rows[i]
                .1
                .get("id")
                .and_then(Value::as_str)
                .map(String::from)
        }))
    }

    async fn update(&self, scope: &SettingsScope, id: &str, patch: Row) -> Result<Row, StoreError> {
        let mut tables = self.lock();
        Self::take_failure(&mut tables)?;
        update_locked(&mut tables, scope, id, patch)
    }

    async fn insert(&self, scope: &SettingsScope, row: Row) -> Result<Row, StoreError> {
        let mut tables = self.lock();
        Self::take_failure(&mut tables)?;
        Ok(insert_locked(&mut tables, scope, row))
    }

    async fn upsert(
        &self,
        scope: &SettingsScope,
        patch: Row,
        insert_row: Row,
    ) -> Result<Row, StoreError> {
        let mut tables = self.lock();
        Self::take_failure(&mut tables)?;
        let existing = find_index(&tables, scope).and_then(|i| {
            tables.rows[i]
                .1
                .get("id")
                .and_then(Value::as_str)
                .map(String::from)
        });
        match existing {
            Some(id) => update_locked(&mut tables, scope, &id, patch),
            None => Ok(insert_locked(&mut tables, scope, insert_row)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_fetch_empty_scope() {
        let store = InMemorySettingsStore::new();
        let rows = store
            .fetch(&SettingsScope::table("display_settings"), Some(1))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let store = InMemorySettingsStore::new();
        let scope = SettingsScope::table("webhook_settings");
        let inserted = store
            .insert(&scope, row(json!({"webhook_url": "", "is_enabled": false})))
            .await
            .unwrap();

        assert!(inserted["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(inserted.contains_key("created_at"));
        assert_eq!(
            store.find_id(&scope).await.unwrap().as_deref(),
            inserted["id"].as_str()
        );
    }

    #[tokio::test]
    async fn test_insert_sets_filter_column() {
        let store = InMemorySettingsStore::new();
        let scope = SettingsScope::filtered("custom_settings", "setting_type", "custom_css");
        let inserted = store.insert(&scope, Row::new()).await.unwrap();
        assert_eq!(inserted["setting_type"], "custom_css");

        let other = SettingsScope::filtered("custom_settings", "setting_type", "head_snippet");
        assert_eq!(store.row_count(&other), 0);
    }

    #[tokio::test]
    async fn test_update_writes_only_patch_columns() {
        let store = InMemorySettingsStore::new();
        let scope = SettingsScope::table("system_settings");
        let inserted = store
            .insert(&scope, row(json!({"store_name": "A", "timezone": "UTC"})))
            .await
            .unwrap();
        let id = inserted["id"].as_str().unwrap().to_string();

        let updated = store
            .update(&scope, &id, row(json!({"store_name": "B"})))
            .await
            .unwrap();
        assert_eq!(updated["store_name"], "B");
        assert_eq!(updated["timezone"], "UTC");
        assert_eq!(updated["id"], inserted["id"]);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store = InMemorySettingsStore::new();
        let result = store
            .update(&SettingsScope::table("system_settings"), "missing", Row::new())
            .await;
        assert_eq!(result, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_fail_next_is_consumed() {
        let store = InMemorySettingsStore::new();
        let scope = SettingsScope::table("pathao_settings");
        store.fail_next(StoreError::Unavailable("network down".into()));

        assert!(matches!(
            store.fetch(&scope, None).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.fetch(&scope, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_upserts_insert_once() {
        let store = Arc::new(InMemorySettingsStore::new());
        let scope = SettingsScope::table("display_settings");

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            let scope = scope.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert(
                        &scope,
                        row(json!({"items_per_page": 10 + i})),
                        row(json!({"items_per_page": 10 + i, "currency_code": "BDT"})),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.row_count(&scope), 1);
    }
}
