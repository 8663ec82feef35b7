//! Courier status change feeds.
//!
//! A feed hands out subscriptions; a subscription yields change events until
//! its connection is lost. Reconnection is the consumer's concern.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::CourierStatusChange;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("Subscription failed: {0}")]
    Subscribe(String),

    #[error("Subscription lost: {0}")]
    Disconnected(String),

    #[error("Malformed change event: {0}")]
    Decode(String),
}

impl FeedError {
    /// Whether the subscription is gone and must be re-established.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FeedError::Decode(_))
    }
}

#[async_trait]
pub trait CourierChangeStream: Send {
    /// Waits for the next change event.
    async fn next_change(&mut self) -> Result<CourierStatusChange, FeedError>;
}

#[async_trait]
pub trait CourierChangeFeed: Send + Sync {
    async fn subscribe(&self) -> Result<Box<dyn CourierChangeStream>, FeedError>;
}

type Event = Result<CourierStatusChange, FeedError>;

#[derive(Debug, Default)]
struct ChannelFeedState {
    subscribers: Vec<mpsc::UnboundedSender<Event>>,
    failing_subscribes: u32,
    subscriptions: u32,
}

/// In-process feed driven by the caller.
#[derive(Debug, Clone, Default)]
pub struct ChannelCourierFeed {
    state: Arc<Mutex<ChannelFeedState>>,
}

impl ChannelCourierFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a change to every live subscription. Returns how many
    /// subscriptions received it.
    pub fn publish(&self, change: CourierStatusChange) -> usize {
        let mut state = self.lock();
        state
            .subscribers
            .retain(|tx| tx.send(Ok(change.clone())).is_ok());
        state.subscribers.len()
    }

    /// Delivers an error event without dropping subscriptions.
    pub fn publish_error(&self, error: FeedError) {
        let mut state = self.lock();
        state.subscribers.retain(|tx| tx.send(Err(error.clone())).is_ok());
    }

    /// Drops every live subscription as if the connection was lost.
    pub fn disconnect_all(&self) {
        let mut state = self.lock();
        for tx in state.subscribers.drain(..) {
            let _ = tx.send(Err(FeedError::Disconnected("connection reset".into())));
        }
    }

    /// Makes the next `n` subscribe calls fail.
    pub fn fail_next_subscribes(&self, n: u32) {
        self.lock().failing_subscribes = n;
    }

    /// Successful subscriptions handed out so far.
    pub fn subscription_count(&self) -> u32 {
        self.lock().subscriptions
    }

    /// Subscriptions whose receiver is still alive.
    pub fn live_subscribers(&self) -> usize {
        let mut state = self.lock();
        state.subscribers.retain(|tx| !tx.is_closed());
        state.subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, ChannelFeedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct ChannelChangeStream {
    rx: mpsc::UnboundedReceiver<Event>,
}

#[async_trait]
impl CourierChangeStream for ChannelChangeStream {
    async fn next_change(&mut self) -> Result<CourierStatusChange, FeedError> {
        match self.rx.recv().await {
            Some(event) => event,
            None => Err(FeedError::Disconnected("feed closed".into())),
        }
    }
}

#[async_trait]
impl CourierChangeFeed for ChannelCourierFeed {
    async fn subscribe(&self) -> Result<Box<dyn CourierChangeStream>, FeedError> {
        let mut state = self.lock();
        if state.failing_subscribes > 0 {
            state.failing_subscribes -= 1;
            return Err(FeedError::Subscribe("listener unavailable".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.subscribers.push(tx);
        state.subscriptions += 1;
        Ok(Box::new(ChannelChangeStream { rx }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourierSnapshot;

    fn change(status: &str) -> CourierStatusChange {
        CourierStatusChange {
            old: CourierSnapshot::default(),
            new: CourierSnapshot {
                courier_status: Some(status.into()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let feed = ChannelCourierFeed::new();
        let mut stream = feed.subscribe().await.unwrap();

        assert_eq!(feed.publish(change("SHIPPED")), 1);
        let received = stream.next_change().await.unwrap();
        assert_eq!(received.new.courier_status.as_deref(), Some("SHIPPED"));
    }

    #[tokio::test]
    async fn test_disconnect_ends_stream() {
        let feed = ChannelCourierFeed::new();
        let mut stream = feed.subscribe().await.unwrap();

        feed.disconnect_all();
        assert!(matches!(
            stream.next_change().await,
            Err(FeedError::Disconnected(_))
        ));
        assert_eq!(feed.publish(change("SHIPPED")), 0);
    }

    #[tokio::test]
    async fn test_failing_subscribes() {
        let feed = ChannelCourierFeed::new();
        feed.fail_next_subscribes(2);

        assert!(feed.subscribe().await.is_err());
        assert!(feed.subscribe().await.is_err());
        assert!(feed.subscribe().await.is_ok());
        assert_eq!(feed.subscription_count(), 1);
    }

    #[test]
    fn test_decode_errors_are_not_fatal() {
        assert!(!FeedError::Decode("bad json".into()).is_fatal());
        assert!(FeedError::Disconnected("gone".into()).is_fatal());
    }
}
