//! Graceful shutdown with long-lived responses open.

mod common;

use std::time::Duration;

use tokio::net::TcpListener;
use uuid::Uuid;

use common::{app, in_memory_state, test_config, token_for};

#[tokio::test]
async fn test_shutdown_completes_with_open_notice_stream() {
    let (state, _) = in_memory_state(test_config());
    let token = token_for(&state, Uuid::new_v4());
    let trigger = state.shutdown_trigger();
    let stopped = state.shutdown_signal();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app(state))
            .with_graceful_shutdown(stopped)
            .await
    });

    let response = reqwest::Client::new()
        .get(format!("http://{}/api/v1/notices/stream", addr))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    trigger.send_replace(true);

    let body = tokio::time::timeout(Duration::from_secs(3), response.text())
        .await
        .expect("notice stream still open after shutdown");
    assert!(body.is_ok());

    let served = tokio::time::timeout(Duration::from_secs(3), server)
        .await
        .expect("server did not finish after shutdown");
    assert!(served.unwrap().is_ok());
}

#[tokio::test]
async fn test_stream_opened_after_shutdown_ends_immediately() {
    let (state, _) = in_memory_state(test_config());
    let token = token_for(&state, Uuid::new_v4());
    let trigger = state.shutdown_trigger();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Served without graceful shutdown so the route stays reachable.
    tokio::spawn(async move { axum::serve(listener, app(state)).await });

    trigger.send_replace(true);

    let response = reqwest::Client::new()
        .get(format!("http://{}/api/v1/notices/stream", addr))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body = tokio::time::timeout(Duration::from_secs(3), response.text())
        .await
        .expect("notice stream did not end");
    assert!(body.unwrap().is_empty());
}
