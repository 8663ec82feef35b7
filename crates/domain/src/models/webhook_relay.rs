//! Payload relayed to the configured courier webhook.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Order and delivery fields sent to the automation webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CourierWebhookPayload {
    #[validate(length(min = 1, max = 64))]
    pub invoice_number: String,
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,
    #[validate(length(min = 1, max = 32))]
    pub customer_phone: String,
    #[validate(length(min = 1, max = 1024))]
    pub customer_address: String,
    #[serde(default)]
    pub consignment_id: Option<String>,
    #[serde(default)]
    pub courier_status: Option<String>,
    #[validate(range(min = 0.0))]
    pub amount_to_collect: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub is_test: bool,
    pub sent_at: DateTime<Utc>,
}

impl CourierWebhookPayload {
    /// Fixed sample used to check a webhook configuration.
    pub fn test_sample() -> Self {
        Self {
            invoice_number: "TEST-0001".to_string(),
            customer_name: "Test Customer".to_string(),
            customer_phone: "01700000000".to_string(),
            customer_address: "House 1, Road 1, Dhaka".to_string(),
            consignment_id: None,
            courier_status: Some("PENDING".to_string()),
            amount_to_collect: 0.0,
            note: Some("Webhook connectivity test".to_string()),
            is_test: true,
            sent_at: Utc::now(),
        }
    }
}

/// Optional overrides for a webhook test request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TestWebhookRequest {
    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_http_url_or_empty"))]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub auth_username: Option<String>,
    #[serde(default)]
    pub auth_password: Option<String>,
}
