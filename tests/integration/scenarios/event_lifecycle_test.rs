//! Event lifecycle journeys
//!
//! An organizer drafts, publishes and closes an event while attendees sign
//! up and cancel around it.

use assert_matches::assert_matches;
use chrono::Duration;
use healing_in_writing::models::{EventStatus, RegistrationFailure, UpdateEventRequest};
use healing_in_writing::services::AuthContext;

use super::ScenarioTestUtils;
use crate::helpers::{test_guest, test_guest_from, TestContext, TestEvent, ADMIN_ID};

#[tokio::test]
async fn test_complete_event_journey() {
    let ctx = TestContext::new();
    let events = &ctx.services.event_service;
    let registrations = &ctx.services.registration_service;

    // Drafts are invisible to signups
    let event = ctx
        .create_event(
            TestEvent::published()
                .with_status(EventStatus::Draft)
                .with_capacity(3)
                .with_tags(&["Grief", "Poetry"]),
        )
        .await;
    let draft_info = ScenarioTestUtils::capacity(&ctx, event.id).await;
    assert!(!draft_info.can_register);
    assert_eq!(draft_info.status_message, "Registration is not open for this event (Draft).");
    let early = registrations.register_user(event.id, 1, None).await.unwrap();
    assert_matches!(early.failure, Some(RegistrationFailure::EventNotOpen));

    events.change_status(event.id, EventStatus::Published).await.unwrap();
    assert_eq!(events.list_upcoming(None).await.unwrap().len(), 1);

    // Attendees sign up
    let alice = registrations.register_user_as(&AuthContext::user(1), event.id).await.unwrap();
    let guest = registrations
        .register_guest(event.id, test_guest_from(1, "192.0.2.10"), None)
        .await
        .unwrap();
    assert!(alice.success);
    assert!(guest.success);
    assert_eq!(ScenarioTestUtils::capacity(&ctx, event.id).await.status_message, "1 spot remaining");

    // Alice changes her mind well ahead of the start
    let alice_id = alice.registration_id.unwrap();
    let cancelled = registrations
        .cancel_registration_as(&AuthContext::user(1), alice_id)
        .await
        .unwrap();
    assert!(cancelled.success);
    assert_eq!(cancelled.message, "Registration cancelled.");
    assert_eq!(ScenarioTestUtils::capacity(&ctx, event.id).await.available_spots, 2);

    // Cancelling twice finds nothing
    let again = registrations.cancel_registration(alice_id, Some(1), None).await.unwrap();
    assert_matches!(again.failure, Some(RegistrationFailure::NotFound));

    // The organizer closes signups early
    events.change_status(event.id, EventStatus::RegistrationClosed).await.unwrap();
    let late = registrations.register_user(event.id, 2, None).await.unwrap();
    assert_matches!(late.failure, Some(RegistrationFailure::EventNotOpen));
    assert!(late.message.contains("RegistrationClosed"));
    assert!(events.list_upcoming(None).await.unwrap().is_empty());

    // An administrator can still seat someone
    let seated = registrations
        .register_user_as(&AuthContext::admin(ADMIN_ID), event.id)
        .await
        .unwrap();
    assert!(seated.success);

    let stored = registrations.get_event_registrations(event.id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().any(|r| r.is_admin_override));

    let details = events.get_event(event.id).await.unwrap().unwrap();
    let tag_names: Vec<&str> = details.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tag_names.len(), 2);
    assert!(tag_names.contains(&"Grief"));
}

#[tokio::test]
async fn test_event_start_freezes_registrations() {
    let ctx = TestContext::new();
    let registrations = &ctx.services.registration_service;
    let event = ctx.create_event(TestEvent::published().starting_in(Duration::hours(72))).await;
    let id = registrations.register_user(event.id, 1, None).await.unwrap().registration_id.unwrap();

    // Inside the cancellation window, registration is still open
    ctx.clock.advance(Duration::hours(30));
    assert!(registrations.register_user(event.id, 2, None).await.unwrap().success);
    let refused = registrations.cancel_registration(id, Some(1), None).await.unwrap();
    assert_matches!(refused.failure, Some(RegistrationFailure::PolicyViolation));

    // After the start nothing self-service works
    ctx.clock.advance(Duration::hours(43));
    let late = registrations.register_guest(event.id, test_guest(1), None).await.unwrap();
    assert_matches!(late.failure, Some(RegistrationFailure::EventStarted));
    let info = ScenarioTestUtils::capacity(&ctx, event.id).await;
    assert_eq!(info.status_message, "This event has already started.");

    // Admin cleanup after the fact
    let forced = registrations
        .cancel_registration_as(&AuthContext::admin(ADMIN_ID), id)
        .await
        .unwrap();
    assert!(forced.success);
}

#[tokio::test]
async fn test_capacity_reduced_below_registrations() {
    let ctx = TestContext::new();
    let registrations = &ctx.services.registration_service;
    let event = ctx.create_event(TestEvent::published().with_capacity(5)).await;
    for user_id in 1..=4 {
        registrations.register_user(event.id, user_id, None).await.unwrap();
    }

    ctx.services
        .event_service
        .update_event(
            event.id,
            UpdateEventRequest {
                capacity: Some(2),
                ..UpdateEventRequest::default()
            },
        )
        .await
        .unwrap();

    let info = ScenarioTestUtils::capacity(&ctx, event.id).await;
    assert_eq!(info.registered_count, 4);
    assert_eq!(info.available_spots, 0);
    assert!(info.is_full);
    assert_eq!(info.status_message, "This event is full.");

    // Existing registrations are kept
    assert!(registrations.is_user_registered(event.id, 4).await.unwrap());
}

#[tokio::test]
async fn test_deleting_event_removes_registrations() {
    let ctx = TestContext::new();
    let registrations = &ctx.services.registration_service;
    let event = ctx.create_event(TestEvent::published()).await;
    let kept = ctx.create_event(TestEvent::published().with_title("Kept")).await;

    registrations.register_user(event.id, 1, None).await.unwrap();
    registrations.register_user(kept.id, 1, None).await.unwrap();
    registrations.register_guest(event.id, test_guest(1), None).await.unwrap();

    ctx.services.event_service.delete_event(event.id).await.unwrap();

    assert!(registrations.get_event_registrations(event.id).await.unwrap().is_empty());
    let remaining = registrations.get_user_registrations(1).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].event_id, kept.id);

    let info = registrations.get_capacity_info(event.id).await.unwrap();
    assert_eq!(info.status_message, "Event not found");
    let missing = registrations.register_user(event.id, 2, None).await.unwrap();
    assert_matches!(missing.failure, Some(RegistrationFailure::NotFound));
}
