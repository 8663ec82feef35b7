//! Settings accessor and upsert executor.
//!
//! One implementation serves every [`SettingsCategory`]. Reads go through the
//! query cache; a successful write invalidates the category's keys and
//! publishes a success notice, a failed one publishes an error notice.

use std::sync::Arc;

use validator::{Validate, ValidationErrors};

use domain::models::settings::{insert_row, patch_to_row, row_to_record};
use domain::models::{CustomCategory, CustomSetting, Notice, SettingsCategory};
use domain::services::{NoticeSink, SettingsStore, StoreError};

use crate::middleware::metrics::record_settings_upsert;
use crate::services::query_cache::QueryCache;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid settings: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Settings encoding failed: {0}")]
    Encoding(String),
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Encoding(err.to_string())
    }
}

#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
    cache: Arc<QueryCache>,
    notices: Arc<dyn NoticeSink>,
}

impl SettingsService {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        cache: Arc<QueryCache>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            store,
            cache,
            notices,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Current record of a category, or its default if never saved.
    pub async fn get<C: SettingsCategory>(&self, category: &C) -> Result<C::Record, SettingsError> {
        self.cache
            .get_or_fetch(category.query_key(), || self.fetch_record(category))
            .await
    }

    /// Reads the category's row from the store, bypassing the cache.
    pub async fn fetch_record<C: SettingsCategory>(
        &self,
        category: &C,
    ) -> Result<C::Record, SettingsError> {
        let rows = self.store.fetch(&category.scope(), Some(1)).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(row_to_record(row)?),
            None => {
                tracing::debug!(category = category.name(), "No settings row, using defaults");
                Ok(category.default_record())
            }
        }
    }

    /// Every stored custom setting.
    pub async fn list_custom(&self) -> Result<Vec<CustomSetting>, SettingsError> {
        self.cache
            .get_or_fetch(CustomCategory::list_query_key(), || async {
                let rows = self.store.fetch(&CustomCategory::list_scope(), None).await?;
                let records = rows
                    .into_iter()
                    .map(row_to_record::<CustomSetting>)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, SettingsError>(records)
            })
            .await
    }

    /// Applies a partial update, inserting the category's row on first save.
    pub async fn upsert<C: SettingsCategory>(
        &self,
        category: &C,
        patch: C::Patch,
    ) -> Result<C::Record, SettingsError> {
        match self.try_upsert(category, &patch).await {
            Ok(record) => {
                self.cache.invalidate(&category.invalidation_keys()).await;
                record_settings_upsert(category.name(), "success");
                self.notices.publish(Notice::success(
                    "Settings saved",
                    format!("{} settings updated successfully", label(category.name())),
                ));
                Ok(record)
            }
            Err(err) => {
                tracing::error!(category = category.name(), error = %err, "Settings upsert failed");
                record_settings_upsert(category.name(), "failure");
                self.notices.publish(Notice::error(
                    "Failed to save settings",
                    err.to_string(),
                ));
                Err(err)
            }
        }
    }

    async fn try_upsert<C: SettingsCategory>(
        &self,
        category: &C,
        patch: &C::Patch,
    ) -> Result<C::Record, SettingsError> {
        patch.validate()?;

        let patch_row = patch_to_row(patch)?;
        let insert = insert_row(category, patch_row.clone())?;
        let row = self
            .store
            .upsert(&category.scope(), patch_row, insert)
            .await?;

        let row_id = row
            .get("id")
            .and_then(|id| id.as_str())
            .unwrap_or_default()
            .to_string();
        tracing::info!(category = category.name(), row_id = %row_id, "Settings saved");

        Ok(row_to_record(row)?)
    }
}

fn label(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
