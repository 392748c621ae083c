//! Test context for unified test setup
//!
//! Wires the services over a fresh `MemoryStore` and a `ManualClock` pinned
//! to a fixed instant, so every rule can be checked at exact offsets.

use std::sync::{Arc, Once};
use chrono::{DateTime, TimeZone, Utc};
use healing_in_writing::config::Settings;
use healing_in_writing::database::{DatabaseService, MemoryStore};
use healing_in_writing::models::{CreateEventRequest, Event};
use healing_in_writing::services::{
    AdminOverride, AuthContext, Clock, ManualClock, ServiceFactory,
};

use super::test_data::TestEvent;

static INIT: Once = Once::new();

pub const ADMIN_ID: i64 = 9000;

/// Fixed starting instant for the manual clock
pub fn test_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 15, 17, 0, 0).unwrap()
}

pub struct TestContext {
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    pub services: ServiceFactory,
    pub settings: Settings,
}

impl TestContext {
    pub fn new() -> Self {
        Self::new_with_settings(Settings::default())
    }

    pub fn new_with_settings(settings: Settings) -> Self {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter("healing_in_writing=debug")
                .with_test_writer()
                .try_init();
        });

        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(test_epoch()));
        let services = ServiceFactory::new(
            &settings,
            DatabaseService::from_memory(store.clone()),
            clock.clone(),
        )
        .expect("Failed to build services");

        Self {
            store,
            clock,
            services,
            settings,
        }
    }

    /// Create an event through the event service
    pub async fn create_event(&self, fixture: TestEvent) -> Event {
        let start = self.clock.now() + fixture.starts_in;
        let request = CreateEventRequest {
            title: fixture.title,
            description: Some("A guided writing session".to_string()),
            event_type: Some("workshop".to_string()),
            status: Some(fixture.status),
            start_date_time: start,
            end_date_time: start + chrono::Duration::hours(2),
            capacity: fixture.capacity,
            owner_id: Some(1),
            address: None,
            tags: fixture.tags,
        };

        self.services
            .event_service
            .create_event(request)
            .await
            .expect("Failed to create test event")
            .event
    }

    pub fn admin_override() -> AdminOverride {
        AuthContext::admin(ADMIN_ID)
            .admin_override()
            .expect("admin context must grant an override")
    }
}
