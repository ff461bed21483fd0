mod common;

use common::Harness;
use std::collections::HashSet;
use std::sync::Arc;
use teesheet_core::CoreError;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_full_flights_admit_exactly_one() {
    const CALLERS: usize = 16;
    let h = Arc::new(Harness::new().await);

    let mut handles = Vec::with_capacity(CALLERS);
    for _ in 0..CALLERS {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            h.coordinator.create_flight(h.tenant, h.request("10:00", 4), None).await
        }));
    }

    let mut booked = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => booked += 1,
            Err(e) if e.is_conflict() => conflicts += 1,
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }

    assert_eq!(booked, 1);
    assert_eq!(conflicts, CALLERS - 1);
    let flights = h.store.all_flights().await;
    assert_eq!(flights.len(), 1);
    assert_eq!(flights[0].player_count(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_small_flights_never_overfill() {
    let h = Arc::new(Harness::new().await);

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let h = h.clone();
            tokio::spawn(async move {
                h.coordinator.create_flight(h.tenant, h.request("11:00", 1), None).await
            })
        })
        .collect();

    for handle in handles {
        if let Err(e) = handle.await.unwrap() {
            assert!(matches!(e, CoreError::SlotLocked | CoreError::CapacityExceeded { .. }), "{:?}", e);
        }
    }

    let seated: usize = h.store.all_flights().await.iter().map(|f| f.players.len()).sum();
    assert!(seated >= 1 && seated <= 4, "seated {}", seated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_booking_numbers_unique_across_slots() {
    let h = Arc::new(Harness::new().await);
    let times = ["06:00", "06:10", "06:20", "06:30", "06:40", "06:50", "07:00", "07:10"];

    let handles: Vec<_> = times
        .iter()
        .map(|time| {
            let h = h.clone();
            let time = time.to_string();
            tokio::spawn(async move {
                h.coordinator.create_flight(h.tenant, h.request(&time, 2), None).await
            })
        })
        .collect();

    let mut numbers = HashSet::new();
    for handle in handles {
        let flight = handle.await.unwrap().unwrap();
        numbers.insert(flight.booking_number);
    }

    let expected: HashSet<String> = (1..=times.len()).map(|n| format!("TT-2026-{:05}", n)).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test]
async fn test_numbering_starts_at_one_per_year() {
    let h = Harness::new().await;
    let first = h.coordinator.create_flight(h.tenant, h.request("06:00", 1), None).await.unwrap();
    let second = h.coordinator.create_flight(h.tenant, h.request("13:50", 1), None).await.unwrap();
    assert_eq!(first.booking_number, "TT-2026-00001");
    assert_eq!(second.booking_number, "TT-2026-00002");

    let mut next_year = h.request("06:00", 1);
    next_year.tee_date = chrono::NaiveDate::from_ymd_opt(2027, 1, 5).unwrap();
    let third = h.coordinator.create_flight(h.tenant, next_year, None).await.unwrap();
    assert_eq!(third.booking_number, "TT-2027-00001");

    // Another tenant keeps its own counter.
    let other = Harness::new().await;
    let theirs = other.coordinator.create_flight(other.tenant, other.request("06:00", 1), None).await.unwrap();
    assert_eq!(theirs.booking_number, "TT-2026-00001");
}
