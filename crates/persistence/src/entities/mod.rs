//! Database entity definitions.
//!
//! Entities are direct mappings to database rows. Settings rows are not
//! mapped here; they travel as JSON through the settings store.

pub mod sale;

pub use sale::SaleCourierEntity;
