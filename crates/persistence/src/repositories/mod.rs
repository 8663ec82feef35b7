//! Repository implementations for database operations.

pub mod operation_log;
pub mod sale;
pub mod settings;
pub mod user;

pub use operation_log::OperationLogRepository;
pub use sale::SaleRepository;
pub use settings::{map_sqlx_error, PgSettingsStore};
pub use user::UserRepository;
