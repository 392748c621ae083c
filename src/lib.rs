//! Healing In Writing
//!
//! Event registration and capacity management for the Healing In Writing
//! community site. This library enforces the booking rules for events:
//! capacity limits, duplicate prevention for members and guests, the
//! cancellation window, guest rate limiting and admin overrides, over
//! Postgres or an in-memory store.

pub mod config;
pub mod services;
pub mod models;
pub mod database;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{HealingError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::{EventService, RegistrationService, ServiceFactory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
