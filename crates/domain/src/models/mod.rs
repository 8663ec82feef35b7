//! Domain models for the storefront backend.

pub mod courier;
pub mod custom_setting;
pub mod display_settings;
pub mod notice;
pub mod operation_log;
pub mod pathao_settings;
pub mod query_key;
pub mod settings;
pub mod system_settings;
pub mod user;
pub mod webhook_relay;
pub mod webhook_settings;

pub use courier::{CourierSnapshot, CourierStatusChange, StatusTransition, COURIER_STATUS_CHANNEL};
pub use custom_setting::{CustomCategory, CustomSetting, CustomSettingPatch, CustomSettingType};
pub use display_settings::{DisplayCategory, DisplaySettings, DisplaySettingsPatch};
pub use notice::{Notice, NoticeLevel};
pub use operation_log::{
    OperationKind, OperationStatus, StopImportRequest, StopOperationResponse, StopSyncRequest,
};
pub use pathao_settings::{PathaoCategory, PathaoEnvironment, PathaoSettings, PathaoSettingsPatch};
pub use query_key::QueryKey;
pub use settings::{Row, SettingsCategory, SettingsScope};
pub use system_settings::{SystemCategory, SystemSettings, SystemSettingsPatch};
pub use user::{
    authorize_user_deletion, AdminDeleteUserRequest, AdminDeleteUserResponse, DeletionDenied,
    UserRole,
};
pub use webhook_relay::{CourierWebhookPayload, TestWebhookRequest};
pub use webhook_settings::{WebhookCategory, WebhookSettings, WebhookSettingsPatch};
