//! Typed client for the management REST API: the wire model for plans,
//! subscriptions and APIs, plus thin async wrappers over each endpoint the
//! console consumes.

pub mod apis;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod plans;
pub mod subscriptions;
