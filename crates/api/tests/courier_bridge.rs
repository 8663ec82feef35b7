//! Realtime courier bridge behavior against an in-process change feed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use uuid::Uuid;

use domain::models::{CourierSnapshot, CourierStatusChange, NoticeLevel, QueryKey};
use domain::services::{
    ChannelCourierFeed, CourierChangeFeed, CourierChangeStream, FeedError, RecordingNoticeSink,
};
use storefront_api::services::{BackoffPolicy, BridgeState, CourierBridge, QueryCache};

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    feed: ChannelCourierFeed,
    cache: Arc<QueryCache>,
    notices: Arc<RecordingNoticeSink>,
}

impl Harness {
    fn new() -> Self {
        Self {
            feed: ChannelCourierFeed::new(),
            cache: Arc::new(QueryCache::new()),
            notices: Arc::new(RecordingNoticeSink::new()),
        }
    }

    fn bridge(&self) -> CourierBridge {
        self.bridge_on(
            Arc::new(self.feed.clone()),
            BackoffPolicy::new(Duration::from_millis(5), Duration::from_millis(20)),
        )
    }

    fn bridge_on(&self, feed: Arc<dyn CourierChangeFeed>, backoff: BackoffPolicy) -> CourierBridge {
        CourierBridge::new(feed, self.cache.clone(), self.notices.clone(), backoff)
    }

    async fn warm(&self, sale_id: Uuid) {
        for key in [QueryKey::sales(), QueryKey::sale(sale_id), QueryKey::settings("display")] {
            self.cache.put(key, serde_json::json!([])).await;
        }
    }

    async fn wait_for_notices(&self, count: usize) {
        tokio::time::timeout(WAIT, async {
            while self.notices.len() < count {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("timed out waiting for notices");
    }
}

/// Feed whose subscribe calls block until the gate is opened.
#[derive(Clone)]
struct GatedFeed {
    inner: ChannelCourierFeed,
    gate: Arc<Semaphore>,
    attempts: Arc<AtomicUsize>,
}

impl GatedFeed {
    fn new(inner: ChannelCourierFeed) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn open(&self) {
        self.gate.add_permits(1);
    }

    async fn wait_for_attempts(&self, count: usize) {
        tokio::time::timeout(WAIT, async {
            while self.attempts.load(Ordering::SeqCst) < count {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("timed out waiting for subscribe");
    }
}

#[axum::async_trait]
impl CourierChangeFeed for GatedFeed {
    async fn subscribe(&self) -> Result<Box<dyn CourierChangeStream>, FeedError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| FeedError::Subscribe(e.to_string()))?;
        self.inner.subscribe().await
    }
}

async fn wait_for_state(
    rx: &mut watch::Receiver<BridgeState>,
    predicate: impl FnMut(&BridgeState) -> bool,
) {
    tokio::time::timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for bridge state")
        .expect("bridge state channel closed");
}

fn change(sale_id: Uuid, from: &str, to: &str) -> CourierStatusChange {
    let snapshot = |status: &str| CourierSnapshot {
        id: Some(sale_id),
        invoice_number: Some("INV-001".to_string()),
        customer_name: Some("Jane Doe".to_string()),
        courier_status: Some(status.to_string()),
        consignment_id: Some("CN-42".to_string()),
    };
    CourierStatusChange {
        old: snapshot(from),
        new: snapshot(to),
    }
}

#[tokio::test]
async fn test_status_change_emits_notice_and_invalidates_sales() {
    let h = Harness::new();
    let sale_id = Uuid::new_v4();
    h.warm(sale_id).await;

    let handle = h.bridge().spawn();
    let mut state = handle.watch_state();
    wait_for_state(&mut state, |s| *s == BridgeState::Active).await;

    assert_eq!(h.feed.publish(change(sale_id, "PENDING", "SHIPPED")), 1);
    h.wait_for_notices(1).await;

    let notices = h.notices.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
    assert!(notices[0].description.contains("PENDING → SHIPPED"));
    assert!(notices[0].description.contains("INV-001"));

    assert_eq!(h.cache.is_stale(&QueryKey::sales()).await, Some(true));
    assert_eq!(h.cache.is_stale(&QueryKey::sale(sale_id)).await, Some(true));
    assert_eq!(
        h.cache.is_stale(&QueryKey::settings("display")).await,
        Some(false)
    );

    handle.teardown().await;
}

#[tokio::test]
async fn test_equal_statuses_are_ignored() {
    let h = Harness::new();
    let sale_id = Uuid::new_v4();
    h.warm(sale_id).await;

    let handle = h.bridge().spawn();
    let mut state = handle.watch_state();
    wait_for_state(&mut state, |s| *s == BridgeState::Active).await;

    h.feed.publish(change(sale_id, "SHIPPED", "SHIPPED"));
    // A later real change proves the first one was processed.
    let other = Uuid::new_v4();
    h.feed.publish(change(other, "PENDING", "DELIVERED"));
    h.wait_for_notices(1).await;

    assert_eq!(h.notices.len(), 1);
    assert!(h.notices.notices()[0].description.contains("PENDING → DELIVERED"));
    assert_eq!(h.cache.is_stale(&QueryKey::sale(sale_id)).await, Some(false));

    handle.teardown().await;
}

#[tokio::test]
async fn test_teardown_drops_queued_notification() {
    let h = Harness::new();
    let sale_id = Uuid::new_v4();
    h.warm(sale_id).await;

    let handle = h.bridge().spawn();
    let mut state = handle.watch_state();
    wait_for_state(&mut state, |s| *s == BridgeState::Active).await;

    // Queued but not yet processed: the single-threaded test runtime does
    // not run the bridge until the next await.
    h.feed.publish(change(sale_id, "PENDING", "SHIPPED"));
    handle.teardown().await;

    assert_eq!(*state.borrow(), BridgeState::TornDown);
    assert!(h.notices.is_empty());
    assert_eq!(h.cache.is_stale(&QueryKey::sales()).await, Some(false));
    assert_eq!(h.feed.live_subscribers(), 0);

    // Nothing is delivered after teardown either.
    assert_eq!(h.feed.publish(change(sale_id, "SHIPPED", "DELIVERED")), 0);
    assert!(h.notices.is_empty());
}

#[tokio::test]
async fn test_disconnect_resubscribes_with_degraded_and_restored_notices() {
    let h = Harness::new();
    let sale_id = Uuid::new_v4();

    let handle = h.bridge().spawn();
    let mut state = handle.watch_state();
    wait_for_state(&mut state, |s| *s == BridgeState::Active).await;

    h.feed.fail_next_subscribes(2);
    h.feed.disconnect_all();

    wait_for_state(&mut state, |s| matches!(s, BridgeState::Reconnecting { .. })).await;
    wait_for_state(&mut state, |s| *s == BridgeState::Active).await;
    h.wait_for_notices(2).await;

    let notices = h.notices.notices();
    assert_eq!(notices.len(), 2, "one warning per outage, one recovery");
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert_eq!(notices[0].title, "Live updates interrupted");
    assert_eq!(notices[1].level, NoticeLevel::Success);
    assert_eq!(notices[1].title, "Live updates restored");
    assert_eq!(h.feed.subscription_count(), 2);

    // Events flow again on the new subscription.
    h.feed.publish(change(sale_id, "PENDING", "SHIPPED"));
    h.wait_for_notices(3).await;
    assert!(h.notices.notices()[2].description.contains("PENDING → SHIPPED"));

    handle.teardown().await;
}

#[tokio::test]
async fn test_initial_subscribe_failure_retries() {
    let h = Harness::new();
    h.feed.fail_next_subscribes(1);

    let handle = h.bridge().spawn();
    let mut state = handle.watch_state();
    wait_for_state(&mut state, |s| *s == BridgeState::Active).await;

    assert_eq!(h.feed.subscription_count(), 1);
    h.wait_for_notices(2).await;
    let levels: Vec<_> = h.notices.notices().iter().map(|n| n.level).collect();
    assert_eq!(levels, vec![NoticeLevel::Warning, NoticeLevel::Success]);

    handle.teardown().await;
}

#[tokio::test]
async fn test_undecodable_event_keeps_subscription() {
    let h = Harness::new();
    let sale_id = Uuid::new_v4();

    let handle = h.bridge().spawn();
    let mut state = handle.watch_state();
    wait_for_state(&mut state, |s| *s == BridgeState::Active).await;

    h.feed
        .publish_error(FeedError::Decode("expected value at line 1".into()));
    h.feed.publish(change(sale_id, "PENDING", "SHIPPED"));
    h.wait_for_notices(1).await;

    assert_eq!(h.feed.subscription_count(), 1);
    assert_eq!(h.notices.notices()[0].level, NoticeLevel::Info);
    assert_eq!(handle.state(), BridgeState::Active);

    handle.teardown().await;
}

#[tokio::test]
async fn test_teardown_while_subscribing_leaks_nothing() {
    let h = Harness::new();
    let gated = GatedFeed::new(h.feed.clone());

    let handle = h
        .bridge_on(
            Arc::new(gated.clone()),
            BackoffPolicy::new(Duration::from_millis(5), Duration::from_millis(20)),
        )
        .spawn();
    let state = handle.watch_state();
    gated.wait_for_attempts(1).await;
    assert_eq!(handle.state(), BridgeState::Subscribing);

    tokio::time::timeout(WAIT, handle.teardown())
        .await
        .expect("teardown waited on a pending subscription");

    // Establishment finishing after teardown must not produce a live subscription.
    gated.open();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(*state.borrow(), BridgeState::TornDown);
    assert_eq!(h.feed.subscription_count(), 0);
    assert_eq!(h.feed.live_subscribers(), 0);
    assert!(h.notices.is_empty());
}

#[tokio::test]
async fn test_teardown_during_backoff_stops_reconnecting() {
    let h = Harness::new();
    h.feed.fail_next_subscribes(1);

    let handle = h
        .bridge_on(
            Arc::new(h.feed.clone()),
            BackoffPolicy::new(Duration::from_secs(60), Duration::from_secs(60)),
        )
        .spawn();
    let mut state = handle.watch_state();
    wait_for_state(&mut state, |s| matches!(s, BridgeState::Reconnecting { .. })).await;

    tokio::time::timeout(WAIT, handle.teardown())
        .await
        .expect("teardown waited out the backoff delay");

    assert_eq!(*state.borrow(), BridgeState::TornDown);
    assert_eq!(h.feed.subscription_count(), 0);
    assert_eq!(h.feed.live_subscribers(), 0);

    let notices = h.notices.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Live updates interrupted");
}
