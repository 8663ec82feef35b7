//! Pathao courier credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::query_key::QueryKey;
use super::settings::{SettingsCategory, SettingsScope};

pub const PATHAO_SETTINGS_TABLE: &str = "pathao_settings";

pub const PATHAO_SANDBOX_BASE_URL: &str = "https://courier-api-sandbox.pathao.com";

/// Delivery type code for normal delivery.
pub const PATHAO_NORMAL_DELIVERY: i32 = 48;
/// Item type code for parcels.
pub const PATHAO_PARCEL_ITEM: i32 = 2;

/// Which Pathao environment the credentials belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathaoEnvironment {
    #[default]
    Sandbox,
    Production,
}

/// Credentials and defaults for the Pathao delivery API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathaoSettings {
    #[serde(default)]
    pub id: String,
    pub environment: PathaoEnvironment,
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub store_id: String,
    pub default_delivery_type: i32,
    pub default_item_type: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for PathaoSettings {
    fn default() -> Self {
        Self {
            id: String::new(),
            environment: PathaoEnvironment::Sandbox,
            base_url: PATHAO_SANDBOX_BASE_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            store_id: String::new(),
            default_delivery_type: PATHAO_NORMAL_DELIVERY,
            default_item_type: PATHAO_PARCEL_ITEM,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Partial update of Pathao credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PathaoSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<PathaoEnvironment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_http_url_or_empty"))]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_numeric_id_or_empty"))]
    pub store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "Delivery type must be positive"))]
    pub default_delivery_type: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "Item type must be positive"))]
    pub default_item_type: Option<i32>,
}

/// The Pathao credentials category.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathaoCategory;

impl SettingsCategory for PathaoCategory {
    type Record = PathaoSettings;
    type Patch = PathaoSettingsPatch;

    fn name(&self) -> &'static str {
        "pathao"
    }

    fn scope(&self) -> SettingsScope {
        SettingsScope::table(PATHAO_SETTINGS_TABLE)
    }

    fn default_record(&self) -> PathaoSettings {
        PathaoSettings::default()
    }

    fn query_key(&self) -> QueryKey {
        QueryKey::settings(self.name())
    }
}
