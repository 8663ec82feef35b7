//! Outbound webhook configuration (n8n relay).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::query_key::QueryKey;
use super::settings::{SettingsCategory, SettingsScope};

pub const WEBHOOK_SETTINGS_TABLE: &str = "webhook_settings";

/// Where courier and order events are relayed, and with which credentials.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WebhookSettings {
    #[serde(default)]
    pub id: String,
    pub webhook_url: String,
    pub auth_username: String,
    pub auth_password: String,
    pub is_enabled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WebhookSettings {
    /// Whether relaying is switched on and has somewhere to go.
    pub fn is_deliverable(&self) -> bool {
        self.is_enabled && !self.webhook_url.is_empty()
    }

    /// Basic-Auth credentials, when a username is configured.
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        if self.auth_username.is_empty() {
            None
        } else {
            Some((&self.auth_username, &self.auth_password))
        }
    }
}

/// Partial update of webhook settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct WebhookSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        custom(function = "shared::validation::validate_http_url_or_empty"),
        length(max = 2048, message = "Webhook URL must be at most 2048 characters")
    )]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub auth_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub auth_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
}

/// The webhook settings category.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookCategory;

impl SettingsCategory for WebhookCategory {
    type Record = WebhookSettings;
    type Patch = WebhookSettingsPatch;

    fn name(&self) -> &'static str {
        "webhook"
    }

    fn scope(&self) -> SettingsScope {
        SettingsScope::table(WEBHOOK_SETTINGS_TABLE)
    }

    fn default_record(&self) -> WebhookSettings {
        WebhookSettings::default()
    }

    fn query_key(&self) -> QueryKey {
        QueryKey::settings(self.name())
    }
}
