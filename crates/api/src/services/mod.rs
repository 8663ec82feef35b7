//! Application services.

pub mod courier_bridge;
pub mod notices;
pub mod query_cache;
pub mod settings;
pub mod webhook_relay;

pub use courier_bridge::{BackoffPolicy, BridgeHandle, BridgeState, CourierBridge};
pub use notices::NoticeHub;
pub use query_cache::QueryCache;
pub use settings::{SettingsError, SettingsService};
pub use webhook_relay::{RelayError, WebhookRelay};
