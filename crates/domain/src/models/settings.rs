//! Settings category abstraction.
//!
//! Every settings category is stored as a single logical row in its own table
//! (or, for custom settings, one row per `setting_type` in a shared table).
//! A category describes where its row lives, what the row looks like before it
//! has ever been saved, and which cached queries go stale when it changes.

use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use super::query_key::QueryKey;

/// A raw settings row as exchanged with a store.
pub type Row = serde_json::Map<String, Value>;

/// Columns owned by the store, never written from a patch.
pub const SYSTEM_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Location of a category's row: a table plus an optional equality filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsScope {
    pub table: &'static str,
    pub filter: Option<(&'static str, String)>,
}

impl SettingsScope {
    /// Scope covering a whole single-category table.
    pub fn table(table: &'static str) -> Self {
        Self {
            table,
            filter: None,
        }
    }

    /// Scope covering the rows of `table` where `column = value`.
    pub fn filtered(table: &'static str, column: &'static str, value: impl Into<String>) -> Self {
        Self {
            table,
            filter: Some((column, value.into())),
        }
    }

    /// Key identifying this scope for mutual exclusion between writers.
    pub fn lock_key(&self) -> String {
        match &self.filter {
            Some((column, value)) => format!("{}:{}={}", self.table, column, value),
            None => self.table.to_string(),
        }
    }

    /// Whether a row belongs to this scope.
    pub fn matches(&self, row: &Row) -> bool {
        match &self.filter {
            Some((column, value)) => row.get(*column).and_then(Value::as_str) == Some(value),
            None => true,
        }
    }
}

/// A settings category.
pub trait SettingsCategory: Send + Sync {
    /// The full row, as returned to callers.
    type Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;
    /// A partial update; unset fields must not serialize.
    type Patch: Serialize + Validate + Send + Sync;

    /// Short name used in logs, metrics and notices.
    fn name(&self) -> &'static str;

    /// Where the row lives.
    fn scope(&self) -> SettingsScope;

    /// The record reported before the category has ever been saved.
    fn default_record(&self) -> Self::Record;

    /// Cache key of the accessor's read.
    fn query_key(&self) -> QueryKey;

    /// Keys that go stale after a successful upsert.
    fn invalidation_keys(&self) -> Vec<QueryKey> {
        vec![self.query_key()]
    }
}

/// Serializes a patch into the row fragment sent to the store.
///
/// Store-owned columns are dropped even if a patch type carries them.
pub fn patch_to_row<P: Serialize>(patch: &P) -> Result<Row, serde_json::Error> {
    match serde_json::to_value(patch)? {
        Value::Object(mut row) => {
            for column in SYSTEM_COLUMNS {
                row.remove(column);
            }
            Ok(row)
        }
        other => Err(serde_json::Error::custom(format!(
            "settings patch must serialize to an object, got {}",
            other
        ))),
    }
}

/// Builds the full row inserted for a never-saved category: the default
/// record with the patch fields laid over it.
pub fn insert_row<C: SettingsCategory>(category: &C, patch: Row) -> Result<Row, serde_json::Error> {
    let mut row = patch_to_row(&category.default_record())?;
    row.extend(patch);
    Ok(row)
}

/// Decodes a store row into a category record.
pub fn row_to_record<R: DeserializeOwned>(row: Row) -> Result<R, serde_json::Error> {
    serde_json::from_value(Value::Object(row))
}
