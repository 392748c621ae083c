//! Helper functions and utilities
//!
//! Small pure functions shared by the services: registrant normalization,
//! capacity wording and pagination.

use chrono::{DateTime, Utc};

/// Normalize a guest email for storage and comparison
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trim an optional free-text field, mapping blank input to `None`
pub fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Normalize a tag name for case-insensitive lookup
pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// "N spots remaining", singular when exactly one
pub fn spots_remaining_message(available: i64) -> String {
    if available == 1 {
        "1 spot remaining".to_string()
    } else {
        format!("{} spots remaining", available)
    }
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Calculate pagination offset
pub fn calculate_offset(page: usize, page_size: usize) -> usize {
    page.saturating_sub(1) * page_size
}
