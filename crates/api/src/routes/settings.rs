//! Settings routes.
//!
//! One GET/PUT pair per settings category, all served by the same generic
//! handlers. Custom settings are addressed by their `setting_type`.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::info;

use domain::models::{
    CustomCategory, CustomSetting, CustomSettingPatch, CustomSettingType, SettingsCategory,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// GET /api/v1/settings/{display,pathao,webhook,system}
///
/// Returns the saved record, or the category default (empty `id`) if the
/// category was never saved.
pub async fn get_settings<C>(State(state): State<AppState>) -> Result<Json<C::Record>, ApiError>
where
    C: SettingsCategory + Default + 'static,
{
    let record = state.settings.get(&C::default()).await?;
    Ok(Json(record))
}

/// PUT /api/v1/settings/{display,pathao,webhook,system}
///
/// Applies a partial update; only the supplied fields change.
pub async fn update_settings<C>(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(patch): Json<C::Patch>,
) -> Result<Json<C::Record>, ApiError>
where
    C: SettingsCategory + Default + 'static,
    C::Patch: DeserializeOwned + 'static,
{
    let category = C::default();
    let record = state.settings.upsert(&category, patch).await?;

    info!(
        user_id = %auth.user_id,
        category = category.name(),
        "Settings updated"
    );

    Ok(Json(record))
}

/// GET /api/v1/settings/custom
pub async fn list_custom_settings(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomSetting>>, ApiError> {
    let settings = state.settings.list_custom().await?;
    Ok(Json(settings))
}

/// GET /api/v1/settings/custom/:setting_type
pub async fn get_custom_setting(
    State(state): State<AppState>,
    Path(setting_type): Path<String>,
) -> Result<Json<CustomSetting>, ApiError> {
    let category = parse_custom_category(&setting_type)?;
    let record = state.settings.get(&category).await?;
    Ok(Json(record))
}

/// PUT /api/v1/settings/custom/:setting_type
pub async fn update_custom_setting(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(setting_type): Path<String>,
    Json(patch): Json<CustomSettingPatch>,
) -> Result<Json<CustomSetting>, ApiError> {
    let category = parse_custom_category(&setting_type)?;
    let record = state.settings.upsert(&category, patch).await?;

    info!(
        user_id = %auth.user_id,
        setting_type = %category.0,
        "Custom setting updated"
    );

    Ok(Json(record))
}

fn parse_custom_category(setting_type: &str) -> Result<CustomCategory, ApiError> {
    setting_type
        .parse::<CustomSettingType>()
        .map(CustomCategory)
        .map_err(ApiError::Validation)
}
