//! Registration service implementation
//!
//! Sole authority for creating, validating and cancelling event
//! registrations and for reporting capacity. The service keeps no state
//! between calls; every rule is evaluated against the stores at call time.
//!
//! Rule failures come back as `RegistrationResult` values. Only storage
//! failures and malformed data surface as `Err`.
//!
//! The duplicate, capacity and guest rate checks read then write without a
//! transaction. Concurrent requests for the last spot can all pass the count
//! check and oversell the event; the same goes for two guests racing with one
//! email. Only the `(event_id, user_id)` unique key is enforced by storage,
//! and a violation of it is reported as a duplicate.

use std::sync::Arc;
use chrono::Duration;
use tracing::{debug, warn};
use crate::config::RegistrationConfig;
use crate::database::{EventStore, RegistrationStore};
use crate::models::{
    CapacityInfo, Event, EventStatus, NewRegistration, Registration, RegistrationFailure,
    RegistrationResult,
};
use crate::services::auth::{AdminOverride, AuthContext};
use crate::services::clock::Clock;
use crate::utils::errors::{HealingError, Result};
use crate::utils::helpers::{clean_optional, normalize_email, spots_remaining_message};
use crate::utils::logging::{log_admin_override, log_registration_action, log_registration_rejected};

/// Tunable limits for registration rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPolicy {
    /// Minimum lead time before event start for self-service cancellation
    pub cancellation_window: Duration,
    /// Guest registrations allowed per IP and event inside `guest_rate_window`
    pub guest_rate_limit: i64,
    pub guest_rate_window: Duration,
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            cancellation_window: Duration::hours(48),
            guest_rate_limit: 3,
            guest_rate_window: Duration::minutes(60),
        }
    }
}

impl TryFrom<&RegistrationConfig> for RegistrationPolicy {
    type Error = HealingError;

    fn try_from(config: &RegistrationConfig) -> Result<Self> {
        let cancellation_window = Duration::try_hours(config.cancellation_window_hours).ok_or_else(|| {
            HealingError::Config(format!(
                "Cancellation window of {} hours is out of range",
                config.cancellation_window_hours
            ))
        })?;
        let guest_rate_window = Duration::try_minutes(config.guest_rate_window_minutes).ok_or_else(|| {
            HealingError::Config(format!(
                "Guest rate window of {} minutes is out of range",
                config.guest_rate_window_minutes
            ))
        })?;

        Ok(Self {
            cancellation_window,
            guest_rate_limit: config.guest_rate_limit,
            guest_rate_window,
        })
    }
}

impl RegistrationPolicy {
    fn rate_window_label(&self) -> String {
        match self.guest_rate_window.num_minutes() {
            60 => "hour".to_string(),
            minutes if minutes % 60 == 0 => format!("{} hours", minutes / 60),
            minutes => format!("{} minutes", minutes),
        }
    }
}

/// Guest contact details submitted with a guest signup
#[derive(Debug, Clone, Default)]
pub struct GuestDetails {
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    /// Submitting address; the rate limit is skipped when absent
    pub ip_address: Option<String>,
}

impl GuestDetails {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }
}

/// Registration service for event signups and cancellations
#[derive(Clone)]
pub struct RegistrationService {
    events: Arc<dyn EventStore>,
    registrations: Arc<dyn RegistrationStore>,
    clock: Arc<dyn Clock>,
    policy: RegistrationPolicy,
}

impl RegistrationService {
    /// Create a new RegistrationService instance
    pub fn new(
        events: Arc<dyn EventStore>,
        registrations: Arc<dyn RegistrationStore>,
        clock: Arc<dyn Clock>,
        policy: RegistrationPolicy,
    ) -> Self {
        Self {
            events,
            registrations,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &RegistrationPolicy {
        &self.policy
    }

    /// Register an authenticated user for an event
    pub async fn register_user(
        &self,
        event_id: i64,
        user_id: i64,
        admin_override: Option<&AdminOverride>,
    ) -> Result<RegistrationResult> {
        debug!(event_id = event_id, user_id = user_id, admin_override = admin_override.is_some(), "Registering user for event");

        let Some(event) = self.events.find_by_id(event_id).await? else {
            return Ok(rejected(None, RegistrationFailure::NotFound, "Event not found"));
        };

        if self.registrations.find_by_event_and_user(event_id, user_id).await?.is_some() {
            return Ok(rejected(
                Some(event_id),
                RegistrationFailure::Duplicate,
                "You are already registered for this event.",
            ));
        }

        match admin_override {
            Some(grant) => log_admin_override(grant.admin_id(), "register_user", event_id),
            None => {
                if let Some(failure) = self.validate_registration(&event).await? {
                    return Ok(failure);
                }
            }
        }

        let new_registration = NewRegistration {
            event_id,
            user_id: Some(user_id),
            guest_name: None,
            guest_email: None,
            guest_phone: None,
            registration_date: self.clock.now(),
            ip_address: None,
            is_admin_override: admin_override.is_some(),
        };

        match self.registrations.add(new_registration).await {
            Ok(registration) => {
                log_registration_action(event_id, registration.id, "register", &registration.registrant());
                Ok(RegistrationResult::registered(registration.id))
            }
            Err(HealingError::UniqueViolation(constraint)) => {
                // Lost a race against a concurrent request for the same user
                warn!(event_id = event_id, user_id = user_id, constraint = %constraint, "Concurrent duplicate registration rejected by storage");
                Ok(rejected(
                    Some(event_id),
                    RegistrationFailure::Duplicate,
                    "You are already registered for this event.",
                ))
            }
            Err(e) => Err(e),
        }
    }

    /// Register a guest (no account) for an event
    pub async fn register_guest(
        &self,
        event_id: i64,
        guest: GuestDetails,
        admin_override: Option<&AdminOverride>,
    ) -> Result<RegistrationResult> {
        let email = normalize_email(&guest.email);
        if email.is_empty() {
            return Ok(rejected(
                Some(event_id),
                RegistrationFailure::ValidationError,
                "Email is required for guest registration.",
            ));
        }

        debug!(event_id = event_id, guest_email = %email, admin_override = admin_override.is_some(), "Registering guest for event");

        let Some(event) = self.events.find_by_id(event_id).await? else {
            return Ok(rejected(None, RegistrationFailure::NotFound, "Event not found"));
        };

        if self.registrations.find_by_event_and_guest_email(event_id, &email).await?.is_some() {
            return Ok(rejected(
                Some(event_id),
                RegistrationFailure::Duplicate,
                "This email is already registered for this event.",
            ));
        }

        let ip_address = clean_optional(guest.ip_address.as_deref());

        if admin_override.is_none() {
            if let Some(ip) = ip_address.as_deref() {
                let since = self.clock.now() - self.policy.guest_rate_window;
                let recent = self.registrations.count_by_event_ip_since(event_id, ip, since).await?;
                if recent >= self.policy.guest_rate_limit {
                    warn!(event_id = event_id, ip_address = %ip, recent = recent, "Guest registration rate limit reached");
                    return Ok(rejected(
                        Some(event_id),
                        RegistrationFailure::RateLimited,
                        format!(
                            "Registration limit reached. Maximum {} registrations per {} from your location.",
                            self.policy.guest_rate_limit,
                            self.policy.rate_window_label()
                        ),
                    ));
                }
            }
        }

        match admin_override {
            Some(grant) => log_admin_override(grant.admin_id(), "register_guest", event_id),
            None => {
                if let Some(failure) = self.validate_registration(&event).await? {
                    return Ok(failure);
                }
            }
        }

        let new_registration = NewRegistration {
            event_id,
            user_id: None,
            guest_name: clean_optional(guest.name.as_deref()),
            guest_email: Some(email),
            guest_phone: clean_optional(guest.phone.as_deref()),
            registration_date: self.clock.now(),
            ip_address,
            is_admin_override: admin_override.is_some(),
        };

        let registration = self.registrations.add(new_registration).await?;
        log_registration_action(event_id, registration.id, "register_guest", &registration.registrant());

        Ok(RegistrationResult::registered(registration.id))
    }

    /// Cancel (delete) a registration
    ///
    /// Without an override, a supplied `requesting_user_id` must own the
    /// registration and the event must start at least the cancellation
    /// window from now. A `None` requester skips the ownership check.
    pub async fn cancel_registration(
        &self,
        registration_id: i64,
        requesting_user_id: Option<i64>,
        admin_override: Option<&AdminOverride>,
    ) -> Result<RegistrationResult> {
        debug!(registration_id = registration_id, requesting_user_id = ?requesting_user_id, admin_override = admin_override.is_some(), "Cancelling registration");

        let Some(registration) = self.registrations.find_by_id(registration_id).await? else {
            return Ok(rejected(None, RegistrationFailure::NotFound, "Registration not found."));
        };

        if admin_override.is_none() {
            if let Some(requester) = requesting_user_id {
                if registration.user_id != Some(requester) {
                    warn!(registration_id = registration_id, requesting_user_id = requester, "Cancellation by non-owner rejected");
                    return Ok(rejected(
                        Some(registration.event_id),
                        RegistrationFailure::Forbidden,
                        "You can only cancel your own registrations.",
                    ));
                }
            }

            let event = self
                .events
                .find_by_id(registration.event_id)
                .await?
                .ok_or(HealingError::EventNotFound { event_id: registration.event_id })?;

            if event.start_date_time - self.clock.now() < self.policy.cancellation_window {
                return Ok(rejected(
                    Some(event.id),
                    RegistrationFailure::PolicyViolation,
                    format!(
                        "Registrations cannot be cancelled less than {} hours before the event starts. Please contact an administrator for assistance.",
                        self.policy.cancellation_window.num_hours()
                    ),
                ));
            }
        }

        if let Some(grant) = admin_override {
            log_admin_override(grant.admin_id(), "cancel_registration", registration_id);
        }

        if !self.registrations.delete(registration_id).await? {
            // Removed by a concurrent cancellation between lookup and delete
            return Ok(rejected(
                Some(registration.event_id),
                RegistrationFailure::NotFound,
                "Registration not found.",
            ));
        }

        log_registration_action(registration.event_id, registration_id, "cancel", &registration.registrant());
        Ok(RegistrationResult::cancelled())
    }

    /// Register the caller's own account, taking any override from the context
    ///
    /// An anonymous context has no account to register and is refused.
    pub async fn register_user_as(&self, ctx: &AuthContext, event_id: i64) -> Result<RegistrationResult> {
        let Some(user_id) = ctx.user_id else {
            return Ok(rejected(
                Some(event_id),
                RegistrationFailure::Forbidden,
                "Please sign in to register with an account.",
            ));
        };
        let grant = ctx.admin_override();
        self.register_user(event_id, user_id, grant.as_ref()).await
    }

    /// Guest signup, taking any override from the context
    pub async fn register_guest_as(&self, ctx: &AuthContext, event_id: i64, guest: GuestDetails) -> Result<RegistrationResult> {
        let grant = ctx.admin_override();
        self.register_guest(event_id, guest, grant.as_ref()).await
    }

    /// Cancellation on behalf of `ctx`
    ///
    /// Admins cancel anything. Everyone else is checked as the owner, and an
    /// anonymous non-admin context is refused outright.
    pub async fn cancel_registration_as(&self, ctx: &AuthContext, registration_id: i64) -> Result<RegistrationResult> {
        if let Some(grant) = ctx.admin_override() {
            return self.cancel_registration(registration_id, None, Some(&grant)).await;
        }

        match ctx.user_id {
            Some(user_id) => self.cancel_registration(registration_id, Some(user_id), None).await,
            None => Ok(rejected(
                None,
                RegistrationFailure::Forbidden,
                "You can only cancel your own registrations.",
            )),
        }
    }

    /// Capacity projection for display; never fails on a missing event
    pub async fn get_capacity_info(&self, event_id: i64) -> Result<CapacityInfo> {
        let Some(event) = self.events.find_by_id(event_id).await? else {
            return Ok(CapacityInfo::not_found());
        };

        let capacity = i64::from(event.capacity);
        let registered_count = self.registrations.count_by_event(event_id).await?;
        let is_full = registered_count >= capacity;
        let is_published = event.is_published();
        let has_started = event.has_started(self.clock.now());
        let can_register = is_published && !is_full && !has_started;
        let available_spots = (capacity - registered_count).max(0);

        let status_message = if !is_published {
            format!("Registration is not open for this event ({}).", event.status)
        } else if has_started {
            "This event has already started.".to_string()
        } else if is_full {
            "This event is full.".to_string()
        } else {
            spots_remaining_message(available_spots)
        };

        Ok(CapacityInfo {
            capacity,
            registered_count,
            available_spots,
            is_full,
            can_register,
            status_message,
        })
    }

    /// Registrations for an event, oldest first
    pub async fn get_event_registrations(&self, event_id: i64) -> Result<Vec<Registration>> {
        debug!(event_id = event_id, "Getting event registrations");
        self.registrations.find_by_event(event_id).await
    }

    /// A user's registrations, newest first
    pub async fn get_user_registrations(&self, user_id: i64) -> Result<Vec<Registration>> {
        debug!(user_id = user_id, "Getting user registrations");
        self.registrations.find_by_user(user_id).await
    }

    pub async fn is_user_registered(&self, event_id: i64, user_id: i64) -> Result<bool> {
        Ok(self.registrations.find_by_event_and_user(event_id, user_id).await?.is_some())
    }

    pub async fn is_guest_registered(&self, event_id: i64, guest_email: &str) -> Result<bool> {
        let email = normalize_email(guest_email);
        Ok(self.registrations.find_by_event_and_guest_email(event_id, &email).await?.is_some())
    }

    /// Shared rules for both signup paths, first failure wins
    async fn validate_registration(&self, event: &Event) -> Result<Option<RegistrationResult>> {
        if event.status != EventStatus::Published {
            return Ok(Some(rejected(
                Some(event.id),
                RegistrationFailure::EventNotOpen,
                format!("Registration is not available. This event is {}.", event.status),
            )));
        }

        if event.has_started(self.clock.now()) {
            return Ok(Some(rejected(
                Some(event.id),
                RegistrationFailure::EventStarted,
                "Registration is closed because the event has already started.",
            )));
        }

        let registered = self.registrations.count_by_event(event.id).await?;
        if registered >= i64::from(event.capacity) {
            return Ok(Some(rejected(
                Some(event.id),
                RegistrationFailure::CapacityExceeded,
                "Registration is closed because the event is full.",
            )));
        }

        Ok(None)
    }
}

fn rejected(event_id: Option<i64>, failure: RegistrationFailure, message: impl Into<String>) -> RegistrationResult {
    let result = RegistrationResult::failed(failure, message);
    log_registration_rejected(event_id, failure.as_str(), &result.message);
    result
}
