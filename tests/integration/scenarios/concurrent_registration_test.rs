//! Concurrent registration tests
//!
//! Only the per-user uniqueness is enforced by storage, so that is the one
//! race with a deterministic outcome. Distinct users racing for the last
//! spots can overshoot capacity, but never by more than the racers who got
//! past the count check.

use futures::future::join_all;
use healing_in_writing::models::RegistrationFailure;

use crate::helpers::{TestContext, TestEvent};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_user_racing_registers_once() {
    let ctx = TestContext::new();
    let event = ctx.create_event(TestEvent::published().with_capacity(50)).await;

    let attempts = (0..8).map(|_| {
        let service = ctx.services.registration_service.clone();
        let event_id = event.id;
        tokio::spawn(async move { service.register_user(event_id, 77, None).await })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked").expect("storage error"))
        .collect();

    let successes = results.iter().filter(|r| r.success).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .filter(|r| !r.success)
        .all(|r| r.failure == Some(RegistrationFailure::Duplicate)));

    let stored = ctx
        .services
        .registration_service
        .get_event_registrations(event.id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_users_fit_within_spare_capacity() {
    let ctx = TestContext::new();
    let event = ctx.create_event(TestEvent::published().with_capacity(20)).await;

    let attempts = (1..=10).map(|user_id| {
        let service = ctx.services.registration_service.clone();
        let event_id = event.id;
        tokio::spawn(async move { service.register_user(event_id, user_id, None).await })
    });

    for joined in join_all(attempts).await {
        let result = joined.expect("task panicked").expect("storage error");
        assert!(result.success, "{}", result.message);
    }

    let info = ctx
        .services
        .registration_service
        .get_capacity_info(event.id)
        .await
        .unwrap();
    assert_eq!(info.registered_count, 10);
    assert_eq!(info.available_spots, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_users_racing_for_last_spot_stay_bounded() {
    let ctx = TestContext::new();
    let capacity: i32 = 1;
    let racers: i64 = 8;
    let event = ctx.create_event(TestEvent::published().with_capacity(capacity)).await;

    let attempts = (1..=racers).map(|user_id| {
        let service = ctx.services.registration_service.clone();
        let event_id = event.id;
        tokio::spawn(async move { service.register_user(event_id, user_id, None).await })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked").expect("storage error"))
        .collect();

    let successes = results.iter().filter(|r| r.success).count() as i64;
    assert!(successes >= 1);
    assert!(results
        .iter()
        .filter(|r| !r.success)
        .all(|r| r.failure == Some(RegistrationFailure::CapacityExceeded)));

    let info = ctx
        .services
        .registration_service
        .get_capacity_info(event.id)
        .await
        .unwrap();
    assert_eq!(info.registered_count, successes);
    assert!(info.registered_count <= i64::from(capacity) + racers);
    assert!(info.is_full);
    assert_eq!(info.available_spots, 0);
}
