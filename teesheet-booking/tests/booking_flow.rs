mod common;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use common::{t, tee_date, Harness};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use teesheet_booking::BookingSideEffect;
use teesheet_core::lock::LockService;
use teesheet_core::memory::InMemoryEventSink;
use teesheet_core::{
    Block, BlockType, BoxError, CoreError, Flight, FlightStatus, SlotKey, StartingHole,
};
use uuid::Uuid;

#[tokio::test]
async fn test_two_then_three_conflicts_with_remaining_two() {
    let h = Harness::new().await;

    let first = h.coordinator.create_flight(h.tenant, h.request("08:00", 2), None).await.unwrap();
    assert_eq!(first.status, FlightStatus::Confirmed);
    assert_eq!(first.booking_number, "TT-2026-00001");

    let err = h
        .coordinator
        .create_flight(h.tenant, h.request("08:00", 3), None)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.remaining_capacity(), Some(2));
    assert!(matches!(err, CoreError::CapacityExceeded { requested: 3, remaining: 2 }));

    // Two more still fit alongside the first flight.
    let second = h.coordinator.create_flight(h.tenant, h.request("08:00", 2), None).await.unwrap();
    assert_eq!(second.booking_number, "TT-2026-00002");

    let err = h
        .coordinator
        .create_flight(h.tenant, h.request("08:00", 1), None)
        .await
        .unwrap_err();
    assert_eq!(err.remaining_capacity(), Some(0));
}

#[tokio::test]
async fn test_nines_are_separate_pools() {
    let h = Harness::new().await;
    h.coordinator.create_flight(h.tenant, h.request("09:00", 4), None).await.unwrap();

    let mut back = h.request("09:00", 4);
    back.starting_hole = StartingHole::Back;
    let flight = h.coordinator.create_flight(h.tenant, back, None).await.unwrap();
    assert_eq!(flight.starting_hole, StartingHole::Back);
}

#[tokio::test]
async fn test_positions_may_repeat_across_flights() {
    let h = Harness::new().await;
    let a = h.coordinator.create_flight(h.tenant, h.request("07:00", 1), None).await.unwrap();
    let b = h.coordinator.create_flight(h.tenant, h.request("07:00", 1), None).await.unwrap();
    assert_eq!(a.players[0].position, 1);
    assert_eq!(b.players[0].position, 1);
}

#[tokio::test]
async fn test_blocked_time_rejected_and_lock_released() {
    let h = Harness::new().await;
    h.store
        .add_block(Block {
            id: Uuid::new_v4(),
            course_id: h.course.id,
            start_time: Utc.with_ymd_and_hms(2026, 5, 12, 10, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2026, 5, 12, 12, 0, 0).unwrap(),
            is_recurring: false,
            recurring_pattern: None,
            block_type: BlockType::Tournament,
            reason: Some("Club championship".into()),
            created_at: Utc::now(),
        })
        .await;

    let req = h.request("10:30", 2);
    let key = SlotKey {
        course_id: req.course_id,
        tee_date: req.tee_date,
        tee_time: req.tee_time,
        starting_hole: req.starting_hole,
    }
    .lock_key();

    let err = h.coordinator.create_flight(h.tenant, req, None).await.unwrap_err();
    match err {
        CoreError::Blocked { reason } => assert_eq!(reason.as_deref(), Some("Club championship")),
        other => panic!("expected Blocked, got {:?}", other),
    }
    assert!(!h.locks.is_held(&key).await);
    assert!(h.store.all_flights().await.is_empty());

    // Just outside the window is fine.
    h.coordinator.create_flight(h.tenant, h.request("12:00", 2), None).await.unwrap();
}

#[tokio::test]
async fn test_held_slot_fails_fast() {
    let h = Harness::new().await;
    let req = h.request("08:30", 2);
    let key = format!("slot:{}:{}:{}", h.course.id, tee_date(), t("08:30"));
    assert!(h.locks.acquire(&key, "someone-else", std::time::Duration::from_secs(30)).await.unwrap());

    let err = h.coordinator.create_flight(h.tenant, req, None).await.unwrap_err();
    assert!(matches!(err, CoreError::SlotLocked));
    assert_eq!(err.to_string(), "tee time is currently being booked");
    // Another caller's lock is left alone.
    assert!(h.locks.is_held(&key).await);
}

#[tokio::test]
async fn test_rejections_before_lock() {
    let h = Harness::new().await;

    let err = h.coordinator.create_flight(h.tenant, h.request("08:05", 2), None).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)), "off-grid: {:?}", err);

    let err = h.coordinator.create_flight(h.tenant, h.request("08:00", 0), None).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let mut odd_holes = h.request("08:00", 2);
    odd_holes.holes = 12;
    assert!(h.coordinator.create_flight(h.tenant, odd_holes, None).await.is_err());

    let err = h
        .coordinator
        .create_flight(Uuid::new_v4(), h.request("08:00", 2), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let mut closed = h.course.clone();
    closed.id = Uuid::new_v4();
    closed.is_active = false;
    h.store.add_course(closed.clone()).await;
    let mut req = h.request("08:00", 2);
    req.course_id = closed.id;
    let err = h.coordinator.create_flight(h.tenant, req, None).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_created_event_recorded() {
    let h = Harness::new().await;
    let flight = h
        .coordinator
        .create_flight(h.tenant, h.request("08:00", 3), Some("starter"))
        .await
        .unwrap();

    let events = h.events.all().await;
    assert_eq!(events.len(), 1);
    let event = &events[0].event;
    assert_eq!(event.event_type, "CREATED");
    assert_eq!(event.aggregate_id, flight.id);
    assert_eq!(event.actor.as_deref(), Some("starter"));
    assert_eq!(event.payload["booking_number"], "TT-2026-00001");
    assert_eq!(event.payload["tee_time"], "08:00");
    assert_eq!(event.payload["player_count"], 3);
}

#[tokio::test]
async fn test_event_sink_failure_keeps_booking() {
    let h = Harness::with_events(InMemoryEventSink::failing()).await;
    let flight = h.coordinator.create_flight(h.tenant, h.request("08:00", 2), None).await.unwrap();
    assert_eq!(h.store.all_flights().await, vec![flight]);
}

struct ExplodingLineItems {
    calls: AtomicUsize,
}

#[async_trait]
impl BookingSideEffect for ExplodingLineItems {
    fn name(&self) -> &str {
        "line-items"
    }

    async fn on_flight_created(&self, _flight: &Flight) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err("pricing service down".into())
    }
}

#[tokio::test]
async fn test_side_effect_failure_keeps_booking() {
    let mut h = Harness::new().await;
    let effect = Arc::new(ExplodingLineItems { calls: AtomicUsize::new(0) });
    h.coordinator = h.coordinator.with_side_effect(effect.clone());

    let flight = h.coordinator.create_flight(h.tenant, h.request("08:00", 2), None).await.unwrap();
    assert_eq!(effect.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.all_flights().await.len(), 1);
    assert_eq!(h.events.all().await[0].event.aggregate_id, flight.id);

    // Rejected bookings never reach the hooks.
    assert!(h.coordinator.create_flight(h.tenant, h.request("08:00", 3), None).await.is_err());
    assert_eq!(effect.calls.load(Ordering::SeqCst), 1);
}
