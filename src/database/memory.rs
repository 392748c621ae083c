//! In-process store
//!
//! Implements both store traits over shared in-memory tables with the same
//! constraint behavior as the Postgres schema: the partial unique key on
//! `(event_id, user_id)`, the registrant check, cascade deletes and the
//! case-insensitive tag name key. Guest emails carry no uniqueness constraint.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use crate::database::repositories::{EventStore, RegistrationStore};
use crate::models::{
    Address, Event, EventChanges, EventStatus, NewAddress, NewEvent, NewRegistration,
    Registration, Tag,
};
use crate::utils::errors::{HealingError, Result};

#[derive(Default)]
struct Tables {
    next_id: i64,
    events: BTreeMap<i64, Event>,
    addresses: BTreeMap<i64, Address>,
    tags: BTreeMap<i64, Tag>,
    event_tags: BTreeSet<(i64, i64)>,
    registrations: BTreeMap<i64, Registration>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared in-memory event and registration tables
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create(&self, event: NewEvent) -> Result<Event> {
        if event.capacity < 1 {
            return Err(HealingError::InvalidInput("capacity must be at least 1".to_string()));
        }

        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let now = Utc::now();
        let event = Event {
            id,
            title: event.title,
            description: event.description,
            event_type: event.event_type,
            status: event.status,
            start_date_time: event.start_date_time,
            end_date_time: event.end_date_time,
            capacity: event.capacity,
            owner_id: event.owner_id,
            address_id: event.address_id,
            created_at: now,
            updated_at: now,
        };
        tables.events.insert(id, event.clone());
        Ok(event)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Event>> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn update(&self, id: i64, changes: EventChanges) -> Result<Option<Event>> {
        if matches!(changes.capacity, Some(capacity) if capacity < 1) {
            return Err(HealingError::InvalidInput("capacity must be at least 1".to_string()));
        }

        let mut tables = self.tables.write().await;
        let Some(event) = tables.events.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            event.title = title;
        }
        if let Some(description) = changes.description {
            event.description = Some(description);
        }
        if let Some(event_type) = changes.event_type {
            event.event_type = Some(event_type);
        }
        if let Some(status) = changes.status {
            event.status = status;
        }
        if let Some(start) = changes.start_date_time {
            event.start_date_time = start;
        }
        if let Some(end) = changes.end_date_time {
            event.end_date_time = end;
        }
        if let Some(capacity) = changes.capacity {
            event.capacity = capacity;
        }
        if let Some(address_id) = changes.address_id {
            event.address_id = Some(address_id);
        }
        event.updated_at = Utc::now();

        Ok(Some(event.clone()))
    }

    async fn set_status(&self, id: i64, status: EventStatus) -> Result<Option<Event>> {
        let mut tables = self.tables.write().await;
        Ok(tables.events.get_mut(&id).map(|event| {
            event.status = status;
            event.updated_at = Utc::now();
            event.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.events.remove(&id).is_none() {
            return Ok(false);
        }
        tables.registrations.retain(|_, r| r.event_id != id);
        tables.event_tags.retain(|(event_id, _)| *event_id != id);
        Ok(true)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Event>> {
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables.events.values().cloned().collect();
        events.sort_by_key(|e| (e.start_date_time, e.id));
        Ok(events
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_upcoming_published(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Event>> {
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|e| e.status == EventStatus::Published && e.start_date_time > now)
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.start_date_time, e.id));
        events.truncate(limit.max(0) as usize);
        Ok(events)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.tables.read().await.events.len() as i64)
    }

    async fn create_address(&self, address: NewAddress) -> Result<Address> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let address = Address {
            id,
            street: address.street,
            city: address.city,
            state: address.state,
            postal_code: address.postal_code,
            country: address.country,
        };
        tables.addresses.insert(id, address.clone());
        Ok(address)
    }

    async fn find_address(&self, id: i64) -> Result<Option<Address>> {
        Ok(self.tables.read().await.addresses.get(&id).cloned())
    }

    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let needle = name.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .tags
            .values()
            .find(|tag| tag.name.to_lowercase() == needle)
            .cloned())
    }

    async fn create_tag(&self, name: &str) -> Result<Tag> {
        let mut tables = self.tables.write().await;
        let needle = name.to_lowercase();
        if tables.tags.values().any(|tag| tag.name.to_lowercase() == needle) {
            return Err(HealingError::UniqueViolation("tags_name_lower_key".to_string()));
        }
        let id = tables.next_id();
        let tag = Tag { id, name: name.to_string() };
        tables.tags.insert(id, tag.clone());
        Ok(tag)
    }

    async fn attach_tag(&self, event_id: i64, tag_id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.events.contains_key(&event_id) {
            return Err(HealingError::EventNotFound { event_id });
        }
        tables.event_tags.insert((event_id, tag_id));
        Ok(())
    }

    async fn clear_tags(&self, event_id: i64) -> Result<()> {
        self.tables
            .write()
            .await
            .event_tags
            .retain(|(id, _)| *id != event_id);
        Ok(())
    }

    async fn tags_for_event(&self, event_id: i64) -> Result<Vec<Tag>> {
        let tables = self.tables.read().await;
        let mut tags: Vec<Tag> = tables
            .event_tags
            .iter()
            .filter(|(id, _)| *id == event_id)
            .filter_map(|(_, tag_id)| tables.tags.get(tag_id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Registration>> {
        Ok(self.tables.read().await.registrations.get(&id).cloned())
    }

    async fn find_by_event(&self, event_id: i64) -> Result<Vec<Registration>> {
        let tables = self.tables.read().await;
        let mut registrations: Vec<Registration> = tables
            .registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        registrations.sort_by_key(|r| (r.registration_date, r.id));
        Ok(registrations)
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Registration>> {
        let tables = self.tables.read().await;
        let mut registrations: Vec<Registration> = tables
            .registrations
            .values()
            .filter(|r| r.user_id == Some(user_id))
            .cloned()
            .collect();
        registrations.sort_by_key(|r| std::cmp::Reverse((r.registration_date, r.id)));
        Ok(registrations)
    }

    async fn find_by_event_and_user(&self, event_id: i64, user_id: i64) -> Result<Option<Registration>> {
        let tables = self.tables.read().await;
        Ok(tables
            .registrations
            .values()
            .find(|r| r.event_id == event_id && r.user_id == Some(user_id))
            .cloned())
    }

    async fn find_by_event_and_guest_email(&self, event_id: i64, guest_email: &str) -> Result<Option<Registration>> {
        let tables = self.tables.read().await;
        Ok(tables
            .registrations
            .values()
            .find(|r| r.event_id == event_id && r.guest_email.as_deref() == Some(guest_email))
            .cloned())
    }

    async fn count_by_event(&self, event_id: i64) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .count() as i64)
    }

    async fn count_by_event_ip_since(&self, event_id: i64, ip_address: &str, since: DateTime<Utc>) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .registrations
            .values()
            .filter(|r| {
                r.event_id == event_id
                    && r.ip_address.as_deref() == Some(ip_address)
                    && r.registration_date >= since
            })
            .count() as i64)
    }

    async fn add(&self, registration: NewRegistration) -> Result<Registration> {
        let mut tables = self.tables.write().await;

        if !tables.events.contains_key(&registration.event_id) {
            return Err(HealingError::EventNotFound { event_id: registration.event_id });
        }
        if registration.user_id.is_some() == registration.guest_email.is_some() {
            return Err(HealingError::InvalidInput(
                "registration needs exactly one of user id or guest email".to_string(),
            ));
        }
        if let Some(user_id) = registration.user_id {
            let taken = tables
                .registrations
                .values()
                .any(|r| r.event_id == registration.event_id && r.user_id == Some(user_id));
            if taken {
                return Err(HealingError::UniqueViolation("registrations_event_user_key".to_string()));
            }
        }

        let id = tables.next_id();
        let registration = Registration {
            id,
            event_id: registration.event_id,
            user_id: registration.user_id,
            guest_name: registration.guest_name,
            guest_email: registration.guest_email,
            guest_phone: registration.guest_phone,
            registration_date: registration.registration_date,
            ip_address: registration.ip_address,
            is_admin_override: registration.is_admin_override,
        };
        tables.registrations.insert(id, registration.clone());
        Ok(registration)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.tables.write().await.registrations.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_event(capacity: i32) -> NewEvent {
        let start = Utc::now() + Duration::days(7);
        NewEvent {
            title: "Writing circle".to_string(),
            description: None,
            event_type: None,
            status: EventStatus::Published,
            start_date_time: start,
            end_date_time: start + Duration::hours(2),
            capacity,
            owner_id: None,
            address_id: None,
        }
    }

    fn user_registration(event_id: i64, user_id: i64) -> NewRegistration {
        NewRegistration {
            event_id,
            user_id: Some(user_id),
            guest_name: None,
            guest_email: None,
            guest_phone: None,
            registration_date: Utc::now(),
            ip_address: None,
            is_admin_override: false,
        }
    }

    #[tokio::test]
    async fn test_user_registration_unique_per_event() {
        let store = MemoryStore::new();
        let event = EventStore::create(&store, new_event(5)).await.unwrap();

        store.add(user_registration(event.id, 7)).await.unwrap();
        let second = store.add(user_registration(event.id, 7)).await;

        assert!(matches!(second, Err(HealingError::UniqueViolation(_))));
        assert_eq!(store.count_by_event(event.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_registration_requires_exactly_one_registrant() {
        let store = MemoryStore::new();
        let event = EventStore::create(&store, new_event(5)).await.unwrap();

        let mut both = user_registration(event.id, 7);
        both.guest_email = Some("a@x.com".to_string());
        assert!(matches!(store.add(both).await, Err(HealingError::InvalidInput(_))));

        let mut neither = user_registration(event.id, 7);
        neither.user_id = None;
        assert!(matches!(store.add(neither).await, Err(HealingError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_event_delete_cascades_registrations() {
        let store = MemoryStore::new();
        let event = EventStore::create(&store, new_event(5)).await.unwrap();
        let registration = store.add(user_registration(event.id, 1)).await.unwrap();

        assert!(EventStore::delete(&store, event.id).await.unwrap());
        assert!(RegistrationStore::find_by_id(&store, registration.id).await.unwrap().is_none());
        assert!(!EventStore::delete(&store, event.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_tag_names_are_case_insensitive() {
        let store = MemoryStore::new();
        let tag = store.create_tag("Poetry").await.unwrap();

        assert_eq!(store.find_tag_by_name("POETRY").await.unwrap(), Some(tag));
        assert!(matches!(store.create_tag("poetry").await, Err(HealingError::UniqueViolation(_))));
    }

    #[tokio::test]
    async fn test_rejects_zero_capacity() {
        let store = MemoryStore::new();
        let result = EventStore::create(&store, new_event(0)).await;
        assert!(matches!(result, Err(HealingError::InvalidInput(_))));
    }
}
