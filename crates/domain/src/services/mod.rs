//! Domain services for the storefront backend.
//!
//! Abstractions over the settings store, notice delivery and the courier
//! change feed, each with an in-process implementation.

pub mod change_feed;
pub mod notice;
pub mod settings_store;

pub use change_feed::{ChannelCourierFeed, CourierChangeFeed, CourierChangeStream, FeedError};
pub use notice::{NoticeSink, RecordingNoticeSink};
pub use settings_store::{InMemorySettingsStore, SettingsStore, StoreError};
