//! HTTP routes served from the in-memory settings store.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::{app, body_json, get, in_memory_state, json_request, test_config, token_for};
use domain::models::{DisplayCategory, SettingsCategory};
use domain::services::StoreError;

#[tokio::test]
async fn test_settings_require_token() {
    let (state, _) = in_memory_state(test_config());

    let response = app(state)
        .oneshot(get("/api/v1/settings/display", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "unauthorized");
}

#[tokio::test]
async fn test_settings_reject_foreign_token() {
    let (state, _) = in_memory_state(test_config());

    let response = app(state)
        .oneshot(get("/api/v1/settings/display", Some("not.a.token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_unsaved_settings_returns_defaults() {
    let (state, _) = in_memory_state(test_config());
    let token = token_for(&state, Uuid::new_v4());

    let response = app(state)
        .oneshot(get("/api/v1/settings/pathao", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], "");
    assert_eq!(body["environment"], "sandbox");
}

#[tokio::test]
async fn test_put_then_get_display_settings() {
    let (state, store) = in_memory_state(test_config());
    let token = token_for(&state, Uuid::new_v4());
    let router = app(state);

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/settings/display",
            Some(&token),
            json!({"business_name": "Corner Shop", "items_per_page": 25}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let saved = body_json(response).await;
    assert_eq!(saved["business_name"], "Corner Shop");
    assert!(!saved["id"].as_str().unwrap().is_empty());

    let response = router
        .oneshot(get("/api/v1/settings/display", Some(&token)))
        .await
        .unwrap();
    let read = body_json(response).await;
    assert_eq!(read["id"], saved["id"]);
    assert_eq!(read["items_per_page"], 25);
    assert_eq!(store.row_count(&DisplayCategory.scope()), 1);
}

#[tokio::test]
async fn test_invalid_patch_is_rejected() {
    let (state, store) = in_memory_state(test_config());
    let token = token_for(&state, Uuid::new_v4());

    let response = app(state)
        .oneshot(json_request(
            "PUT",
            "/api/v1/settings/display",
            Some(&token),
            json!({"items_per_page": 1}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");
    assert_eq!(store.row_count(&DisplayCategory.scope()), 0);
}

#[tokio::test]
async fn test_store_failure_maps_to_status() {
    let (state, store) = in_memory_state(test_config());
    let token = token_for(&state, Uuid::new_v4());
    store.fail_next(StoreError::PermissionDenied("row-level security".into()));

    let response = app(state)
        .oneshot(json_request(
            "PUT",
            "/api/v1/settings/system",
            Some(&token),
            json!({"maintenance_mode": true}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_custom_settings_by_type() {
    let (state, _) = in_memory_state(test_config());
    let token = token_for(&state, Uuid::new_v4());
    let router = app(state);

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/settings/custom/custom_css",
            Some(&token),
            json!({"content": "body { margin: 0 }", "is_enabled": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["setting_type"], "custom_css");

    let response = router
        .clone()
        .oneshot(get("/api/v1/settings/custom", Some(&token)))
        .await
        .unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = router
        .clone()
        .oneshot(get("/api/v1/settings/custom/head_snippet", Some(&token)))
        .await
        .unwrap();
    let unsaved = body_json(response).await;
    assert_eq!(unsaved["id"], "");
    assert_eq!(unsaved["setting_type"], "head_snippet");

    let response = router
        .oneshot(get("/api/v1/settings/custom/footer", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upsert_publishes_notice_to_subscribers() {
    let (state, _) = in_memory_state(test_config());
    let token = token_for(&state, Uuid::new_v4());
    let mut notices = state.notices.subscribe();

    app(state)
        .oneshot(json_request(
            "PUT",
            "/api/v1/settings/webhook",
            Some(&token),
            json!({"webhook_url": "", "is_enabled": false}),
        ))
        .await
        .unwrap();

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.title, "Settings saved");
    assert_eq!(notice.description, "Webhook settings updated successfully");
}

#[tokio::test]
async fn test_setup_status_bypass_skips_database() {
    let mut config = test_config();
    config.setup.bypass_first_time_check = true;
    let (state, _) = in_memory_state(config);

    let response = app(state)
        .oneshot(get("/api/v1/setup/status", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["is_first_time"], false);
    assert_eq!(body["bypassed"], true);
}

#[tokio::test]
async fn test_test_webhook_without_configuration() {
    let (state, _) = in_memory_state(test_config());
    let token = token_for(&state, Uuid::new_v4());

    let response = app(state)
        .oneshot(json_request(
            "POST",
            "/functions/v1/test-webhook",
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Webhook is not configured or disabled"
    );
}

#[tokio::test]
async fn test_functions_require_token() {
    let (state, _) = in_memory_state(test_config());

    let response = app(state)
        .oneshot(json_request(
            "POST",
            "/functions/v1/stop-import",
            None,
            json!({"importLogId": Uuid::new_v4()}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_liveness_and_request_id() {
    let (state, _) = in_memory_state(test_config());

    let response = app(state)
        .oneshot(get("/api/health/live", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_json(response).await["status"], "alive");
}
