//! Shared utilities and common types for the Storefront backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Verification of platform-issued JWT access tokens
//! - Common validation logic for settings input

pub mod jwt;
pub mod validation;
