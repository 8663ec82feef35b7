//! Persistence layer for the storefront backend.
//!
//! This crate contains:
//! - Database connection management and embedded migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the Postgres settings store
//! - The `LISTEN/NOTIFY` courier change feed

pub mod db;
pub mod entities;
pub mod metrics;
pub mod realtime;
pub mod repositories;
