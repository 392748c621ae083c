//! Error handling for Healing In Writing
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy. Expected business-rule
//! failures are not errors: they travel in `RegistrationResult`.

use thiserror::Error;

/// Postgres SQLSTATE for `unique_violation`
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Main error type for the application
#[derive(Error, Debug)]
pub enum HealingError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for HealingError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return HealingError::UniqueViolation(constraint);
            }
        }
        HealingError::Database(err)
    }
}

/// Result type alias for application operations
pub type Result<T> = std::result::Result<T, HealingError>;

impl HealingError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            HealingError::Database(_) => false,
            HealingError::Migration(_) => false,
            HealingError::Config(_) => false,
            HealingError::ConfigLoad(_) => false,
            HealingError::PermissionDenied(_) => false,
            HealingError::EventNotFound { .. } => false,
            HealingError::UniqueViolation(_) => true,
            HealingError::InvalidInput(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HealingError::Database(_) => ErrorSeverity::Critical,
            HealingError::Migration(_) => ErrorSeverity::Critical,
            HealingError::Config(_) => ErrorSeverity::Critical,
            HealingError::ConfigLoad(_) => ErrorSeverity::Critical,
            HealingError::PermissionDenied(_) => ErrorSeverity::Warning,
            HealingError::UniqueViolation(_) => ErrorSeverity::Warning,
            HealingError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
