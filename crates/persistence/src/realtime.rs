//! Courier change feed over Postgres `LISTEN/NOTIFY`.
//!
//! The `sales_courier_status_notify` trigger publishes `{old, new}` on
//! [`COURIER_STATUS_CHANNEL`] whenever a sale's courier status is written with a
//! non-null value.

use async_trait::async_trait;
use sqlx::postgres::PgListener;
use sqlx::PgPool;

use domain::models::{CourierStatusChange, COURIER_STATUS_CHANNEL};
use domain::services::{CourierChangeFeed, CourierChangeStream, FeedError};

/// Opens one `LISTEN` connection per subscription.
#[derive(Clone)]
pub struct PgCourierFeed {
    pool: PgPool,
}

impl PgCourierFeed {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct PgCourierStream {
    listener: PgListener,
}

/// Decodes a notification payload.
pub fn decode_change(payload: &str) -> Result<CourierStatusChange, FeedError> {
    serde_json::from_str(payload).map_err(|e| FeedError::Decode(e.to_string()))
}

#[async_trait]
impl CourierChangeStream for PgCourierStream {
    async fn next_change(&mut self) -> Result<CourierStatusChange, FeedError> {
        // Ok(None): the connection dropped and notifications may have been lost.
        match self.listener.try_recv().await {
            Ok(Some(notification)) => decode_change(notification.payload()),
            Ok(None) => Err(FeedError::Disconnected("LISTEN connection lost".into())),
            Err(e) => Err(FeedError::Disconnected(e.to_string())),
        }
    }
}

#[async_trait]
impl CourierChangeFeed for PgCourierFeed {
    async fn subscribe(&self) -> Result<Box<dyn CourierChangeStream>, FeedError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| FeedError::Subscribe(e.to_string()))?;
        listener
            .listen(COURIER_STATUS_CHANNEL)
            .await
            .map_err(|e| FeedError::Subscribe(e.to_string()))?;

        tracing::debug!(channel = COURIER_STATUS_CHANNEL, "LISTEN established");
        Ok(Box::new(PgCourierStream { listener }))
    }
}
