//! Realtime courier status bridge.
//!
//! Subscribes to the courier change feed and turns each status transition
//! into a user notice plus invalidation of the cached sales queries. A lost
//! subscription is re-established with exponential backoff; the first failure
//! of an outage publishes a warning notice and recovery publishes another.
//!
//! Once torn down the bridge emits nothing, even for events already queued.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use domain::models::{CourierStatusChange, Notice};
use domain::services::{CourierChangeFeed, CourierChangeStream, FeedError, NoticeSink};

use crate::middleware::metrics::{record_courier_status_notice, record_realtime_resubscription};
use crate::services::query_cache::QueryCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Subscribing,
    Active,
    Reconnecting { attempt: u32 },
    TornDown,
}

impl BridgeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeState::Subscribing => "subscribing",
            BridgeState::Active => "active",
            BridgeState::Reconnecting { .. } => "reconnecting",
            BridgeState::TornDown => "torn_down",
        }
    }
}

/// Exponential backoff with jitter.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max }
    }

    /// Upper bound of the delay before reconnect `attempt` (1-based).
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.initial.saturating_mul(1u32 << exp).min(self.max)
    }

    /// Delay before reconnect `attempt`, uniformly drawn from the upper half
    /// of the ceiling.
    pub fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt);
        let half = ceiling / 2;
        let jitter_ms = rand::thread_rng().gen_range(0..=half.as_millis() as u64);
        half + Duration::from_millis(jitter_ms)
    }
}

pub struct CourierBridge {
    feed: Arc<dyn CourierChangeFeed>,
    cache: Arc<QueryCache>,
    notices: Arc<dyn NoticeSink>,
    backoff: BackoffPolicy,
}

/// Handle to a running bridge.
pub struct BridgeHandle {
    cancel: CancellationToken,
    state: watch::Receiver<BridgeState>,
    task: JoinHandle<()>,
}

impl BridgeHandle {
    pub fn state(&self) -> BridgeState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<BridgeState> {
        self.state.clone()
    }

    /// Cancels the subscription and waits for the bridge task to finish.
    pub async fn teardown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Courier bridge task failed");
        }
    }
}

impl CourierBridge {
    pub fn new(
        feed: Arc<dyn CourierChangeFeed>,
        cache: Arc<QueryCache>,
        notices: Arc<dyn NoticeSink>,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            feed,
            cache,
            notices,
            backoff,
        }
    }

    /// Starts the bridge on the current runtime.
    pub fn spawn(self) -> BridgeHandle {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(BridgeState::Subscribing);
        let task = tokio::spawn(self.run(cancel.clone(), state_tx));
        BridgeHandle {
            cancel,
            state: state_rx,
            task,
        }
    }

    async fn run(self, cancel: CancellationToken, state: watch::Sender<BridgeState>) {
        let mut attempt: u32 = 0;
        let mut degraded = false;

        loop {
            let subscribed = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.feed.subscribe() => result,
            };

            let failure = match subscribed {
                Ok(stream) => {
                    if cancel.is_cancelled() {
                        break;
                    }
                    state.send_replace(BridgeState::Active);
                    tracing::info!("Courier status updates live");
                    if degraded {
                        degraded = false;
                        self.notices.publish(Notice::success(
                            "Live updates restored",
                            "Courier status updates are live again",
                        ));
                    }
                    attempt = 0;

                    match self.pump(stream, &cancel).await {
                        Some(err) => err,
                        None => break,
                    }
                }
                Err(err) => err,
            };

            attempt = attempt.saturating_add(1);
            tracing::warn!(error = %failure, attempt, "Courier status subscription lost");
            if !degraded {
                degraded = true;
                self.notices.publish(Notice::warning(
                    "Live updates interrupted",
                    "Courier status updates are delayed while reconnecting",
                ));
            }
            record_realtime_resubscription();
            state.send_replace(BridgeState::Reconnecting { attempt });

            let delay = self.backoff.delay(attempt);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        state.send_replace(BridgeState::TornDown);
        tracing::info!("Courier bridge torn down");
    }

    /// Handles events until the stream fails (returns the error) or the
    /// bridge is cancelled (returns `None`).
    async fn pump(
        &self,
        mut stream: Box<dyn CourierChangeStream>,
        cancel: &CancellationToken,
    ) -> Option<FeedError> {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                next = stream.next_change() => next,
            };
            if cancel.is_cancelled() {
                return None;
            }

            match next {
                Ok(change) => self.handle_change(change).await,
                Err(err) if !err.is_fatal() => {
                    tracing::warn!(error = %err, "Skipping courier change event");
                }
                Err(err) => return Some(err),
            }
        }
    }

    async fn handle_change(&self, change: CourierStatusChange) {
        let Some(transition) = change.transition() else {
            tracing::debug!("Courier status unchanged, ignoring");
            return;
        };

        tracing::info!(
            sale_id = %transition.sale_id,
            from = transition.from.as_deref().unwrap_or("N/A"),
            to = transition.to.as_deref().unwrap_or("N/A"),
            "Courier status changed"
        );
        self.cache.invalidate(&transition.invalidation_keys()).await;
        self.notices.publish(transition.notice());
        record_courier_status_notice();
    }
}
