//! Event service implementation
//!
//! Event CRUD, status changes, address composition and tag attachment.
//! Supplies the event facts (existence, status, capacity, start time) the
//! registration service depends on.

use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::database::EventStore;
use crate::models::event::{
    CreateEventRequest, Event, EventChanges, EventDetails, EventStatus, NewEvent, Tag,
    UpdateEventRequest,
};
use crate::services::clock::Clock;
use crate::utils::errors::{HealingError, Result};
use crate::utils::helpers::{calculate_offset, clean_optional, normalize_tag_name};
use crate::utils::logging::log_event_action;

const MAX_PAGE_SIZE: i64 = 100;

/// Event service for managing events
#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
}

impl EventService {
    /// Create a new EventService instance
    pub fn new(events: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self { events, clock }
    }

    /// Create an event with its address and tags
    pub async fn create_event(&self, request: CreateEventRequest) -> Result<EventDetails> {
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(HealingError::InvalidInput("Event title is required".to_string()));
        }
        validate_capacity(request.capacity)?;
        warn_if_inverted(&title, &request);

        let address = match request.address {
            Some(address) => Some(self.events.create_address(address).await?),
            None => None,
        };

        let event = self
            .events
            .create(NewEvent {
                title,
                description: clean_optional(request.description.as_deref()),
                event_type: clean_optional(request.event_type.as_deref()),
                status: request.status.unwrap_or(EventStatus::Draft),
                start_date_time: request.start_date_time,
                end_date_time: request.end_date_time,
                capacity: request.capacity,
                owner_id: request.owner_id,
                address_id: address.as_ref().map(|a| a.id),
            })
            .await?;

        let tags = self.attach_tags(event.id, &request.tags).await?;
        log_event_action(event.id, "create", request.owner_id, Some(&event.title));

        Ok(EventDetails { event, address, tags })
    }

    /// Partial update; tags and address are replaced when supplied
    pub async fn update_event(&self, event_id: i64, request: UpdateEventRequest) -> Result<EventDetails> {
        debug!(event_id = event_id, "Updating event");

        if let Some(capacity) = request.capacity {
            validate_capacity(capacity)?;
        }
        if matches!(request.title.as_deref(), Some(title) if title.trim().is_empty()) {
            return Err(HealingError::InvalidInput("Event title cannot be empty".to_string()));
        }
        if self.events.find_by_id(event_id).await?.is_none() {
            return Err(HealingError::EventNotFound { event_id });
        }

        let address_id = match request.address {
            Some(address) => Some(self.events.create_address(address).await?.id),
            None => None,
        };

        let changes = EventChanges {
            title: request.title.map(|t| t.trim().to_string()),
            description: request.description,
            event_type: request.event_type,
            status: request.status,
            start_date_time: request.start_date_time,
            end_date_time: request.end_date_time,
            capacity: request.capacity,
            address_id,
        };

        let event = self
            .events
            .update(event_id, changes)
            .await?
            .ok_or(HealingError::EventNotFound { event_id })?;

        if event.start_date_time >= event.end_date_time {
            warn!(event_id = event_id, "Event ends before it starts");
        }

        if let Some(tags) = request.tags {
            self.events.clear_tags(event_id).await?;
            self.attach_tags(event_id, &tags).await?;
        }

        log_event_action(event_id, "update", event.owner_id, None);
        self.details(event).await
    }

    /// Move an event to another status
    ///
    /// Any transition is accepted; lifecycle policy belongs to the caller.
    pub async fn change_status(&self, event_id: i64, status: EventStatus) -> Result<Event> {
        let current = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(HealingError::EventNotFound { event_id })?;

        let event = self
            .events
            .set_status(event_id, status)
            .await?
            .ok_or(HealingError::EventNotFound { event_id })?;

        info!(event_id = event_id, from = %current.status, to = %status, "Event status changed");
        Ok(event)
    }

    /// Delete an event together with its registrations
    pub async fn delete_event(&self, event_id: i64) -> Result<()> {
        if !self.events.delete(event_id).await? {
            return Err(HealingError::EventNotFound { event_id });
        }
        log_event_action(event_id, "delete", None, None);
        Ok(())
    }

    pub async fn get_event(&self, event_id: i64) -> Result<Option<EventDetails>> {
        match self.events.find_by_id(event_id).await? {
            Some(event) => Ok(Some(self.details(event).await?)),
            None => Ok(None),
        }
    }

    /// List events with pagination
    pub async fn list_events(&self, limit: i64, offset: i64) -> Result<Vec<Event>> {
        debug!(limit = limit, offset = offset, "Listing events with pagination");

        if limit > MAX_PAGE_SIZE {
            return Err(HealingError::InvalidInput(format!("Limit cannot exceed {}", MAX_PAGE_SIZE)));
        }
        if limit < 0 || offset < 0 {
            return Err(HealingError::InvalidInput("Limit and offset cannot be negative".to_string()));
        }

        self.events.list(limit, offset).await
    }

    /// One-based page of events
    pub async fn list_events_page(&self, page: usize, page_size: usize) -> Result<Vec<Event>> {
        let offset = calculate_offset(page, page_size) as i64;
        self.list_events(page_size as i64, offset).await
    }

    /// Published events that have not started yet
    pub async fn list_upcoming(&self, limit: Option<i64>) -> Result<Vec<Event>> {
        if matches!(limit, Some(limit) if limit < 0) {
            return Err(HealingError::InvalidInput("Limit cannot be negative".to_string()));
        }
        let limit = limit.unwrap_or(50).min(MAX_PAGE_SIZE);
        self.events.list_upcoming_published(self.clock.now(), limit).await
    }

    pub async fn count_events(&self) -> Result<i64> {
        self.events.count().await
    }

    /// Attach tags by name, creating missing ones
    pub async fn add_tags(&self, event_id: i64, names: &[String]) -> Result<Vec<Tag>> {
        if self.events.find_by_id(event_id).await?.is_none() {
            return Err(HealingError::EventNotFound { event_id });
        }
        self.attach_tags(event_id, names).await?;
        self.events.tags_for_event(event_id).await
    }

    /// Find a tag by name ignoring case, else create it as typed
    pub async fn find_or_create_tag(&self, name: &str) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HealingError::InvalidInput("Tag name cannot be empty".to_string()));
        }

        if let Some(tag) = self.events.find_tag_by_name(name).await? {
            return Ok(tag);
        }

        match self.events.create_tag(name).await {
            Ok(tag) => Ok(tag),
            // Created concurrently under another casing
            Err(HealingError::UniqueViolation(_)) => self
                .events
                .find_tag_by_name(name)
                .await?
                .ok_or_else(|| HealingError::InvalidInput(format!("Tag '{}' vanished after conflict", name))),
            Err(e) => Err(e),
        }
    }

    async fn attach_tags(&self, event_id: i64, names: &[String]) -> Result<Vec<Tag>> {
        let mut seen = std::collections::HashSet::new();
        for name in names {
            if name.trim().is_empty() || !seen.insert(normalize_tag_name(name)) {
                continue;
            }
            let tag = self.find_or_create_tag(name).await?;
            self.events.attach_tag(event_id, tag.id).await?;
        }
        self.events.tags_for_event(event_id).await
    }

    async fn details(&self, event: Event) -> Result<EventDetails> {
        let address = match event.address_id {
            Some(id) => self.events.find_address(id).await?,
            None => None,
        };
        let tags = self.events.tags_for_event(event.id).await?;
        Ok(EventDetails { event, address, tags })
    }
}

fn validate_capacity(capacity: i32) -> Result<()> {
    if capacity < 1 {
        return Err(HealingError::InvalidInput("Capacity must be at least 1".to_string()));
    }
    Ok(())
}

// start < end is not enforced, only reported
fn warn_if_inverted(title: &str, request: &CreateEventRequest) {
    if request.start_date_time >= request.end_date_time {
        warn!(title = %title, "Event ends before it starts");
    }
}
