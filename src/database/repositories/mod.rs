//! Database repositories module
//!
//! The services talk to storage through the `EventStore` and
//! `RegistrationStore` traits. `EventRepository` and `RegistrationRepository`
//! implement them over Postgres; `MemoryStore` implements both in process.

pub mod event;
pub mod registration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::models::{
    Address, Event, EventChanges, EventStatus, NewAddress, NewEvent, NewRegistration,
    Registration, Tag,
};
use crate::utils::errors::Result;

// Re-export repositories
pub use event::EventRepository;
pub use registration::RegistrationRepository;

/// Event, address and tag persistence
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create(&self, event: NewEvent) -> Result<Event>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Event>>;

    /// Apply non-`None` changes; `None` when the event does not exist
    async fn update(&self, id: i64, changes: EventChanges) -> Result<Option<Event>>;

    async fn set_status(&self, id: i64, status: EventStatus) -> Result<Option<Event>>;

    /// Delete an event and, by cascade, its registrations and tag links
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Event>>;

    /// Published events starting after `now`, soonest first
    async fn list_upcoming_published(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Event>>;

    async fn count(&self) -> Result<i64>;

    async fn create_address(&self, address: NewAddress) -> Result<Address>;

    async fn find_address(&self, id: i64) -> Result<Option<Address>>;

    /// Case-insensitive lookup
    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>>;

    async fn create_tag(&self, name: &str) -> Result<Tag>;

    /// Idempotent
    async fn attach_tag(&self, event_id: i64, tag_id: i64) -> Result<()>;

    async fn clear_tags(&self, event_id: i64) -> Result<()>;

    async fn tags_for_event(&self, event_id: i64) -> Result<Vec<Tag>>;
}

/// Registration persistence
///
/// `add` must reject a second row for the same `(event_id, user_id)` with
/// `HealingError::UniqueViolation`. Guest emails carry no such constraint.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Registration>>;

    /// Oldest first
    async fn find_by_event(&self, event_id: i64) -> Result<Vec<Registration>>;

    /// Newest first
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Registration>>;

    async fn find_by_event_and_user(&self, event_id: i64, user_id: i64) -> Result<Option<Registration>>;

    /// `guest_email` must already be lower-cased
    async fn find_by_event_and_guest_email(&self, event_id: i64, guest_email: &str) -> Result<Option<Registration>>;

    async fn count_by_event(&self, event_id: i64) -> Result<i64>;

    /// Registrations for the event from `ip_address` at or after `since`
    async fn count_by_event_ip_since(&self, event_id: i64, ip_address: &str, since: DateTime<Utc>) -> Result<i64>;

    async fn add(&self, registration: NewRegistration) -> Result<Registration>;

    async fn delete(&self, id: i64) -> Result<bool>;
}
