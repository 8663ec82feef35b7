//! Notice fan-out to connected clients.

use tokio::sync::broadcast;

use domain::models::{Notice, NoticeLevel};
use domain::services::NoticeSink;

const NOTICE_BUFFER: usize = 256;

/// Broadcasts notices to every open notice stream.
///
/// Publishing never blocks and never fails; with no subscribers the notice is
/// only logged. Slow subscribers lose the oldest notices.
#[derive(Debug, Clone)]
pub struct NoticeHub {
    tx: broadcast::Sender<Notice>,
}

impl Default for NoticeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_BUFFER);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

impl NoticeSink for NoticeHub {
    fn publish(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => {
                tracing::warn!(title = %notice.title, description = %notice.description, "Notice")
            }
            _ => tracing::info!(title = %notice.title, description = %notice.description, "Notice"),
        }
        // Err only means nobody is listening.
        let _ = self.tx.send(notice);
    }
}
