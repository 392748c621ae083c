//! Test data builders

use chrono::Duration;
use healing_in_writing::models::EventStatus;
use healing_in_writing::services::GuestDetails;

/// Event fixture, timed relative to the test clock
#[derive(Debug, Clone)]
pub struct TestEvent {
    pub title: String,
    pub status: EventStatus,
    pub starts_in: Duration,
    pub capacity: i32,
    pub tags: Vec<String>,
}

impl TestEvent {
    /// Published, a week out, room for ten
    pub fn published() -> Self {
        Self {
            title: "Writing Through Grief".to_string(),
            status: EventStatus::Published,
            starts_in: Duration::days(7),
            capacity: 10,
            tags: vec![],
        }
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn starting_in(mut self, starts_in: Duration) -> Self {
        self.starts_in = starts_in;
        self
    }

    pub fn with_capacity(mut self, capacity: i32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// Guest with a predictable email
pub fn test_guest(n: usize) -> GuestDetails {
    GuestDetails::new(format!("Guest {}", n), format!("guest{}@example.org", n))
        .with_phone("555-0100")
}

/// Guest submitting from `ip`
pub fn test_guest_from(n: usize, ip: &str) -> GuestDetails {
    test_guest(n).with_ip(ip)
}
