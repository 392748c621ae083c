//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{HealingError, Result};
use super::Settings;

/// Longest cancellation window or guest rate window accepted
const MAX_POLICY_WINDOW_HOURS: i64 = 24 * 366;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_logging_config(&settings.logging)?;
    validate_registration_config(&settings.registration)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(HealingError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(HealingError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(HealingError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(HealingError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(HealingError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    if config.directory.is_some() && config.file_prefix.is_empty() {
        return Err(HealingError::Config(
            "Log file prefix is required when a log directory is set".to_string()
        ));
    }

    Ok(())
}

/// Validate registration policy configuration
fn validate_registration_config(config: &super::RegistrationConfig) -> Result<()> {
    if config.cancellation_window_hours < 0 {
        return Err(HealingError::Config(
            "Cancellation window cannot be negative".to_string()
        ));
    }

    if config.cancellation_window_hours > MAX_POLICY_WINDOW_HOURS {
        return Err(HealingError::Config(
            format!("Cancellation window cannot exceed {} hours", MAX_POLICY_WINDOW_HOURS)
        ));
    }

    if config.guest_rate_limit <= 0 {
        return Err(HealingError::Config(
            "Guest rate limit must be greater than 0".to_string()
        ));
    }

    if config.guest_rate_window_minutes <= 0 {
        return Err(HealingError::Config(
            "Guest rate window must be greater than 0".to_string()
        ));
    }

    if config.guest_rate_window_minutes > MAX_POLICY_WINDOW_HOURS * 60 {
        return Err(HealingError::Config(
            format!("Guest rate window cannot exceed {} minutes", MAX_POLICY_WINDOW_HOURS * 60)
        ));
    }

    Ok(())
}
