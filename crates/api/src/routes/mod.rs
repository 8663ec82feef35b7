//! HTTP route handlers.

pub mod courier;
pub mod functions;
pub mod health;
pub mod notices;
pub mod settings;
pub mod setup;
