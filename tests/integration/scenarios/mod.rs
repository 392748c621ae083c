//! Integration test scenarios
//!
//! Complete organizer and attendee journeys, plus concurrent signups.

pub mod concurrent_registration_test;
pub mod event_lifecycle_test;

use healing_in_writing::models::CapacityInfo;

use crate::helpers::TestContext;

/// Common scenario test utilities
pub struct ScenarioTestUtils;

impl ScenarioTestUtils {
    /// Capacity projection with the stored registration count cross-checked
    pub async fn capacity(ctx: &TestContext, event_id: i64) -> CapacityInfo {
        let info = ctx
            .services
            .registration_service
            .get_capacity_info(event_id)
            .await
            .expect("capacity projection should not fail");
        let listed = ctx
            .services
            .registration_service
            .get_event_registrations(event_id)
            .await
            .expect("listing registrations should not fail");
        assert_eq!(info.registered_count, listed.len() as i64);
        info
    }
}
