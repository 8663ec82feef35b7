//! Courier webhook relay.
//!
//! Posts order and delivery fields to the automation webhook configured in
//! the webhook settings, with Basic-Auth when a username is set.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{info, warn};

use domain::models::{CourierWebhookPayload, TestWebhookRequest, WebhookSettings};

/// Errors that can occur while relaying to the webhook.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Webhook is not configured or disabled")]
    NotConfigured,

    #[error("Webhook responded with status {status}")]
    Rejected { status: u16, body: String },

    #[error("Webhook request failed: {0}")]
    Http(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Http(err.to_string())
    }
}

pub struct WebhookRelay {
    client: Client,
}

impl WebhookRelay {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });

        Self { client }
    }

    /// Sends `payload` to the configured webhook. Returns the response status.
    pub async fn send(
        &self,
        settings: &WebhookSettings,
        payload: &CourierWebhookPayload,
    ) -> Result<u16, RelayError> {
        if !settings.is_deliverable() {
            return Err(RelayError::NotConfigured);
        }

        let mut request = self.client.post(&settings.webhook_url).json(payload);
        if let Some((username, password)) = settings.basic_auth() {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                invoice_number = %payload.invoice_number,
                status = status.as_u16(),
                "Webhook rejected courier payload"
            );
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            invoice_number = %payload.invoice_number,
            status = status.as_u16(),
            is_test = payload.is_test,
            "Courier payload relayed"
        );
        Ok(status.as_u16())
    }
}

/// Stored settings with a test request's overrides applied. An overriding
/// URL enables the webhook for the test.
pub fn apply_overrides(mut settings: WebhookSettings, overrides: &TestWebhookRequest) -> WebhookSettings {
    if let Some(url) = overrides.webhook_url.as_deref().filter(|u| !u.is_empty()) {
        settings.webhook_url = url.to_string();
        settings.is_enabled = true;
    }
    if let Some(username) = &overrides.auth_username {
        settings.auth_username = username.clone();
    }
    if let Some(password) = &overrides.auth_password {
        settings.auth_password = password.clone();
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    async fn spawn_receiver(status: StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        let app = Router::new().route(
            "/hook",
            post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    sink.lock().unwrap().push((auth, body));
                    status
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/hook", addr), captured)
    }

    fn settings(url: &str) -> WebhookSettings {
        WebhookSettings {
            webhook_url: url.to_string(),
            is_enabled: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_disabled_webhook_is_not_configured() {
        let relay = WebhookRelay::new(Duration::from_secs(2));
        let mut settings = settings("http://127.0.0.1:9/hook");
        settings.is_enabled = false;

        let result = relay
            .send(&settings, &CourierWebhookPayload::test_sample())
            .await;
        assert!(matches!(result, Err(RelayError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_send_posts_payload_with_basic_auth() {
        let (url, captured) = spawn_receiver(StatusCode::OK).await;
        let relay = WebhookRelay::new(Duration::from_secs(5));
        let mut settings = settings(&url);
        settings.auth_username = "relay".into();
        settings.auth_password = "s3cret".into();

        let status = relay
            .send(&settings, &CourierWebhookPayload::test_sample())
            .await
            .unwrap();
        assert_eq!(status, 200);

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let (auth, body) = &captured[0];
        // base64("relay:s3cret")
        assert_eq!(auth.as_deref(), Some("Basic cmVsYXk6czNjcmV0"));
        assert_eq!(body["invoice_number"], "TEST-0001");
        assert_eq!(body["is_test"], true);
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() {
        let (url, _captured) = spawn_receiver(StatusCode::UNAUTHORIZED).await;
        let relay = WebhookRelay::new(Duration::from_secs(5));

        let result = relay
            .send(&settings(&url), &CourierWebhookPayload::test_sample())
            .await;
        match result {
            Err(RelayError::Rejected { status, .. }) => assert_eq!(status, 401),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_apply_overrides() {
        let stored = WebhookSettings {
            webhook_url: "https://stored.example.com".into(),
            auth_username: "stored".into(),
            ..Default::default()
        };
        let overrides = TestWebhookRequest {
            webhook_url: Some("https://override.example.com".into()),
            auth_username: None,
            auth_password: Some("pw".into()),
        };

        let merged = apply_overrides(stored, &overrides);
        assert_eq!(merged.webhook_url, "https://override.example.com");
        assert!(merged.is_enabled);
        assert_eq!(merged.auth_username, "stored");
        assert_eq!(merged.auth_password, "pw");
    }

    #[test]
    fn test_empty_override_keeps_stored_url() {
        let stored = WebhookSettings {
            webhook_url: "https://stored.example.com".into(),
            ..Default::default()
        };
        let overrides = TestWebhookRequest {
            webhook_url: Some(String::new()),
            ..Default::default()
        };
        let merged = apply_overrides(stored, &overrides);
        assert_eq!(merged.webhook_url, "https://stored.example.com");
        assert!(!merged.is_enabled);
    }
}
