//! Display preference settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::query_key::QueryKey;
use super::settings::{SettingsCategory, SettingsScope};

pub const DISPLAY_SETTINGS_TABLE: &str = "display_settings";

/// How amounts, dates and lists are shown across the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub id: String,
    pub business_name: String,
    pub currency_code: String,
    pub currency_symbol: String,
    pub date_format: String,
    pub items_per_page: i32,
    pub low_stock_threshold: i32,
    pub show_low_stock_alerts: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            id: String::new(),
            business_name: String::new(),
            currency_code: "BDT".to_string(),
            currency_symbol: "৳".to_string(),
            date_format: "DD/MM/YYYY".to_string(),
            items_per_page: 20,
            low_stock_threshold: 5,
            show_low_stock_alerts: true,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Partial update of display settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DisplaySettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 120, message = "Business name must be at most 120 characters"))]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_currency_code"))]
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 8, message = "Currency symbol must be 1-8 characters"))]
    pub currency_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 32, message = "Date format must be 1-32 characters"))]
    pub date_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 5, max = 200, message = "Items per page must be between 5 and 200"))]
    pub items_per_page: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "Low stock threshold cannot be negative"))]
    pub low_stock_threshold: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_low_stock_alerts: Option<bool>,
}

/// The display settings category.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayCategory;

impl SettingsCategory for DisplayCategory {
    type Record = DisplaySettings;
    type Patch = DisplaySettingsPatch;

    fn name(&self) -> &'static str {
        "display"
    }

    fn scope(&self) -> SettingsScope {
        SettingsScope::table(DISPLAY_SETTINGS_TABLE)
    }

    fn default_record(&self) -> DisplaySettings {
        DisplaySettings::default()
    }

    fn query_key(&self) -> QueryKey {
        QueryKey::settings(self.name())
    }
}
