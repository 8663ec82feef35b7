//! Notice delivery.

use std::sync::Mutex;

use crate::models::Notice;

/// Destination for user-facing notices.
pub trait NoticeSink: Send + Sync {
    fn publish(&self, notice: Notice);
}

/// Keeps every published notice. Used in tests.
#[derive(Debug, Default)]
pub struct RecordingNoticeSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNoticeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NoticeSink for RecordingNoticeSink {
    fn publish(&self, notice: Notice) {
        tracing::debug!(title = %notice.title, "Recording notice");
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notice);
    }
}
