//! Custom CSS and HTML snippet settings.
//!
//! Unlike the other categories these share one table, partitioned by
//! `setting_type`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::query_key::QueryKey;
use super::settings::{SettingsCategory, SettingsScope};

pub const CUSTOM_SETTINGS_TABLE: &str = "custom_settings";
pub const CUSTOM_SETTING_TYPE_COLUMN: &str = "setting_type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomSettingType {
    CustomCss,
    HeadSnippet,
    BodySnippet,
}

impl CustomSettingType {
    pub const ALL: [CustomSettingType; 3] = [
        CustomSettingType::CustomCss,
        CustomSettingType::HeadSnippet,
        CustomSettingType::BodySnippet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomSettingType::CustomCss => "custom_css",
            CustomSettingType::HeadSnippet => "head_snippet",
            CustomSettingType::BodySnippet => "body_snippet",
        }
    }
}

impl std::fmt::Display for CustomSettingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CustomSettingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CustomSettingType::ALL
            .into_iter()
            .find(|setting_type| setting_type.as_str() == s)
            .ok_or_else(|| format!("Unknown custom setting type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomSetting {
    #[serde(default)]
    pub id: String,
    pub setting_type: CustomSettingType,
    pub content: String,
    pub is_enabled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CustomSetting {
    pub fn empty(setting_type: CustomSettingType) -> Self {
        Self {
            id: String::new(),
            setting_type,
            content: String::new(),
            is_enabled: false,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Partial update of one custom setting. The type comes from the category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CustomSettingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100000, message = "Content is too long"))]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
}

/// One custom setting, identified by its type.
#[derive(Debug, Clone, Copy)]
pub struct CustomCategory(pub CustomSettingType);

impl CustomCategory {
    /// Key of the list of all custom settings.
    pub fn list_query_key() -> QueryKey {
        QueryKey::settings("custom")
    }

    /// Scope covering every custom setting row.
    pub fn list_scope() -> SettingsScope {
        SettingsScope::table(CUSTOM_SETTINGS_TABLE)
    }
}

impl SettingsCategory for CustomCategory {
    type Record = CustomSetting;
    type Patch = CustomSettingPatch;

    fn name(&self) -> &'static str {
        "custom"
    }

    fn scope(&self) -> SettingsScope {
        SettingsScope::filtered(
            CUSTOM_SETTINGS_TABLE,
            CUSTOM_SETTING_TYPE_COLUMN,
            self.0.as_str(),
        )
    }

    fn default_record(&self) -> CustomSetting {
        CustomSetting::empty(self.0)
    }

    fn query_key(&self) -> QueryKey {
        QueryKey::settings(&format!("custom:{}", self.0))
    }

    fn invalidation_keys(&self) -> Vec<QueryKey> {
        vec![self.query_key(), Self::list_query_key()]
    }
}
