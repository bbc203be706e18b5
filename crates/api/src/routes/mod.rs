//! HTTP route handlers.

pub mod friends;
pub mod health;
pub mod members;
pub mod metrics;
