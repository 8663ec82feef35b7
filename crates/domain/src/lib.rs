//! Domain layer for the Storefront backend.
//!
//! This crate contains:
//! - Settings categories, their records, patches and cache keys
//! - Courier status change events and user-facing notices
//! - Store, notice and change-feed abstractions with in-memory implementations

pub mod models;
pub mod services;
