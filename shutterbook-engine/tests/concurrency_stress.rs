//! Concurrency stress tests for last-slot scenarios: many callers race
//! the same slot and exactly one may win.

mod common;

use std::sync::Arc;

use common::{harness, t, SessionConfig};
use shutterbook_domain::EngineError;

/// 50 concurrent hold attempts for one slot: exactly one succeeds, the
/// rest observe `SlotUnavailable`.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn only_one_of_many_concurrent_holds_wins() {
    let h = Arc::new(harness(SessionConfig::default()).await);
    let slot_id = h.slots[0].id;

    let mut handles = Vec::new();
    for i in 0..50 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            let contact = format!("visitor-{}@example.com", i);
            h.holds.place_hold(slot_id, &contact, t(0)).await
        }));
    }

    let mut wins = 0;
    let mut losses = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(slot) => {
                wins += 1;
                assert!(slot.held_by.is_some());
            }
            Err(EngineError::SlotUnavailable { .. }) => losses += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(wins, 1, "exactly one hold must win");
    assert_eq!(losses, 49);
}

/// Concurrent confirms against one live hold produce exactly one
/// booking; every other caller fails, none with a duplicate.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_confirms_produce_exactly_one_booking() {
    let h = Arc::new(harness(SessionConfig::default()).await);
    let slot_id = h.slots[0].id;
    let contact = "alice@example.com";

    h.holds.place_hold(slot_id, contact, t(0)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            h.confirmer
                .confirm(slot_id, "alice@example.com", None, t(1))
                .await
        }));
    }

    let mut bookings = Vec::new();
    let mut failures = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(b) => bookings.push(b),
            Err(e) => {
                assert!(e.is_contention(), "unexpected error: {e}");
                failures += 1;
            }
        }
    }

    assert_eq!(bookings.len(), 1, "at most one booking per slot");
    assert_eq!(failures, 9);
}

/// Hold-vs-steal race on a stale hold: the expired hold is up for
/// grabs, but still only one of the racers may take it.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn stale_hold_steal_has_a_single_winner() {
    let h = Arc::new(harness(SessionConfig::default()).await);
    let slot_id = h.slots[0].id;

    h.holds
        .place_hold(slot_id, "sleeper@example.com", t(0))
        .await
        .unwrap();

    // Past expiry, a crowd shows up.
    let mut handles = Vec::new();
    for i in 0..20 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            let contact = format!("racer-{}@example.com", i);
            h.holds.place_hold(slot_id, &contact, t(6)).await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);

    let slot = h.slot_state(slot_id).await;
    assert_ne!(slot.held_by.as_deref(), Some("sleeper@example.com"));
}
