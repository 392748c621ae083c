//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for registration and event management.

use tracing::{info, warn, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use crate::config::LoggingConfig;
use crate::utils::errors::{HealingError, Result};

/// Initialize logging based on configuration
///
/// The returned guard must be held for the lifetime of the process, otherwise
/// buffered file output is dropped.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| HealingError::Config(format!("Invalid log filter '{}': {}", config.level, e)))?;

    let stdout_layer = if config.json {
        tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stdout).boxed()
    };

    let (file_layer, guard) = match config.directory.as_deref() {
        Some(directory) if !directory.is_empty() => {
            let file_appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed();
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| HealingError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log a successful registration action
pub fn log_registration_action(event_id: i64, registration_id: i64, action: &str, registrant: &str) {
    info!(
        event_id = event_id,
        registration_id = registration_id,
        action = action,
        registrant = registrant,
        "Registration action performed"
    );
}

/// Log a registration rejected by a business rule
pub fn log_registration_rejected(event_id: Option<i64>, reason: &str, message: &str) {
    debug!(
        event_id = event_id,
        reason = reason,
        message = message,
        "Registration request rejected"
    );
}

/// Log an operation performed under admin override
pub fn log_admin_override(admin_id: Option<i64>, action: &str, target: i64) {
    warn!(
        admin_id = admin_id,
        action = action,
        target = target,
        "Admin override applied"
    );
}

/// Log event management actions
pub fn log_event_action(event_id: i64, action: &str, user_id: Option<i64>, details: Option<&str>) {
    info!(
        event_id = event_id,
        action = action,
        user_id = user_id,
        details = details,
        "Event action performed"
    );
}
