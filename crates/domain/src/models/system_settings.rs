//! System-wide settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::query_key::QueryKey;
use super::settings::{SettingsCategory, SettingsScope};

pub const SYSTEM_SETTINGS_TABLE: &str = "system_settings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSettings {
    #[serde(default)]
    pub id: String,
    pub store_name: String,
    pub timezone: String,
    pub maintenance_mode: bool,
    pub allow_registration: bool,
    pub woocommerce_import_enabled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            id: String::new(),
            store_name: "My Store".to_string(),
            timezone: "Asia/Dhaka".to_string(),
            maintenance_mode: false,
            allow_registration: false,
            woocommerce_import_enabled: false,
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SystemSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120, message = "Store name must be 1-120 characters"))]
    pub store_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_timezone"))]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_registration: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub woocommerce_import_enabled: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCategory;

impl SettingsCategory for SystemCategory {
    type Record = SystemSettings;
    type Patch = SystemSettingsPatch;

    fn name(&self) -> &'static str {
        "system"
    }

    fn scope(&self) -> SettingsScope {
        SettingsScope::table(SYSTEM_SETTINGS_TABLE)
    }

    fn default_record(&self) -> SystemSettings {
        SystemSettings::default()
    }

    fn query_key(&self) -> QueryKey {
        QueryKey::settings(self.name())
    }
}
