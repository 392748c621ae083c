//! Registration model
//!
//! A registration ties either an authenticated user or a guest (name, email,
//! phone) to an event. Registrations are never updated in place: they are
//! inserted on signup and deleted on cancellation.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    pub user_id: Option<i64>,
    pub guest_name: Option<String>,
    /// Stored lower-cased
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub registration_date: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub is_admin_override: bool,
}

impl Registration {
    pub fn is_guest(&self) -> bool {
        self.user_id.is_none()
    }

    /// Human-readable registrant identity for logs
    pub fn registrant(&self) -> String {
        match (self.user_id, self.guest_email.as_deref()) {
            (Some(user_id), _) => format!("user:{}", user_id),
            (None, Some(email)) => format!("guest:{}", email),
            (None, None) => "unknown".to_string(),
        }
    }
}

/// Insert payload for the registration store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRegistration {
    pub event_id: i64,
    pub user_id: Option<i64>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub registration_date: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub is_admin_override: bool,
}

/// Reason a registration request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationFailure {
    NotFound,
    Duplicate,
    ValidationError,
    RateLimited,
    PolicyViolation,
    Forbidden,
    CapacityExceeded,
    EventNotOpen,
    EventStarted,
}

impl RegistrationFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationFailure::NotFound => "not_found",
            RegistrationFailure::Duplicate => "duplicate",
            RegistrationFailure::ValidationError => "validation_error",
            RegistrationFailure::RateLimited => "rate_limited",
            RegistrationFailure::PolicyViolation => "policy_violation",
            RegistrationFailure::Forbidden => "forbidden",
            RegistrationFailure::CapacityExceeded => "capacity_exceeded",
            RegistrationFailure::EventNotOpen => "event_not_open",
            RegistrationFailure::EventStarted => "event_started",
        }
    }
}

/// Outcome of a register or cancel operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResult {
    pub success: bool,
    pub message: String,
    pub registration_id: Option<i64>,
    pub failure: Option<RegistrationFailure>,
}

impl RegistrationResult {
    pub fn registered(registration_id: i64) -> Self {
        Self {
            success: true,
            message: "Registration successful.".to_string(),
            registration_id: Some(registration_id),
            failure: None,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            success: true,
            message: "Registration cancelled.".to_string(),
            registration_id: None,
            failure: None,
        }
    }

    pub fn failed(failure: RegistrationFailure, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            registration_id: None,
            failure: Some(failure),
        }
    }
}

/// Capacity and availability projection for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityInfo {
    pub capacity: i64,
    pub registered_count: i64,
    pub available_spots: i64,
    pub is_full: bool,
    pub can_register: bool,
    pub status_message: String,
}

impl CapacityInfo {
    pub fn not_found() -> Self {
        Self {
            capacity: 0,
            registered_count: 0,
            available_spots: 0,
            is_full: false,
            can_register: false,
            status_message: "Event not found".to_string(),
        }
    }
}
