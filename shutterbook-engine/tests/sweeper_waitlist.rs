//! Sweeper reclamation and waitlist promotion ordering.

mod common;

use common::{harness, t, SessionConfig};
use shutterbook_domain::{SlotRepository, SlotStatus, WaitlistStatus};

const ALICE: &str = "alice@example.com";

/// Running the sweep twice never double-reclaims a slot or
/// double-notifies the waitlist for the same release.
#[tokio::test]
async fn double_sweep_is_idempotent() {
    let h = harness(SessionConfig::default()).await;
    let slot_id = h.slots[0].id;

    h.holds.place_hold(slot_id, ALICE, t(0)).await.unwrap();
    h.join_waitlist_at("standby@example.com", true, vec![], t(1)).await;

    // Nothing to do while the hold is live.
    let early = h.sweeper.sweep(t(3)).await.unwrap();
    assert_eq!(early.reclaimed, 0);

    let first = h.sweeper.sweep(t(6)).await.unwrap();
    assert_eq!(first.reclaimed, 1);
    assert_eq!(first.promoted, 1);
    assert_eq!(h.notifier.promoted_count(), 1);

    // The standby's promotional hold is live now; a second pass finds
    // nothing expired and must not touch it.
    let second = h.sweeper.sweep(t(6)).await.unwrap();
    assert_eq!(second.reclaimed, 0);
    assert_eq!(second.promoted, 0);
    assert_eq!(h.notifier.promoted_count(), 1);

    let slot = h.slot_state(slot_id).await;
    assert_eq!(slot.status, SlotStatus::Held);
    assert_eq!(slot.held_by.as_deref(), Some("standby@example.com"));
}

/// A hold renewed between the sweeper's read and write keeps its slot:
/// the reclaim is keyed on the expiry the scan observed.
#[tokio::test]
async fn renewed_hold_is_not_clobbered_by_reclaim() {
    let h = harness(SessionConfig::default()).await;
    let slot_id = h.slots[0].id;

    h.holds.place_hold(slot_id, ALICE, t(0)).await.unwrap();
    let observed_until = t(5);

    // The holder renews after the sweeper's scan would have seen t+5.
    h.holds.renew_hold(slot_id, ALICE, t(4)).await.unwrap();

    let repo: &dyn SlotRepository = h.store.as_ref();
    let reclaimed = repo.try_reclaim(slot_id, observed_until, t(6)).await.unwrap();
    assert!(!reclaimed, "stale expiry must no longer match");
    assert_eq!(h.slot_state(slot_id).await.held_by.as_deref(), Some(ALICE));
}

/// FIFO promotion with expiry cascade: entries joined at t1 < t2 < t3
/// are promoted in order as each promotional hold lapses unconverted.
#[tokio::test]
async fn promotion_is_fifo_and_cascades_on_expiry() {
    let h = harness(SessionConfig::default()).await;
    let slot_id = h.slots[0].id;

    h.holds.place_hold(slot_id, ALICE, t(0)).await.unwrap();
    let booking = h.confirmer.confirm(slot_id, ALICE, None, t(1)).await.unwrap();

    let first = h.join_waitlist_at("first@example.com", true, vec![], t(2)).await;
    let second = h.join_waitlist_at("second@example.com", false, vec![], t(3)).await;
    let third = h.join_waitlist_at("third@example.com", true, vec![], t(4)).await;

    // Release promotes the earliest entry.
    h.confirmer.cancel(booking.id, t(10)).await.unwrap();
    assert_eq!(h.entry_status(first.id).await, WaitlistStatus::Notified);
    assert_eq!(h.entry_status(second.id).await, WaitlistStatus::Waiting);

    // First never converts; the sweep expires it and promotes second
    // (a session-wide entry matches any date of the session).
    let report = h.sweeper.sweep(t(16)).await.unwrap();
    assert_eq!(report.reclaimed, 1);
    assert_eq!(report.promoted, 1);
    assert_eq!(h.entry_status(first.id).await, WaitlistStatus::Expired);
    assert_eq!(h.entry_status(second.id).await, WaitlistStatus::Notified);

    let report = h.sweeper.sweep(t(22)).await.unwrap();
    assert_eq!(report.promoted, 1);
    assert_eq!(h.entry_status(second.id).await, WaitlistStatus::Expired);
    assert_eq!(h.entry_status(third.id).await, WaitlistStatus::Notified);

    // The line is exhausted: the slot finally rests available.
    let report = h.sweeper.sweep(t(28)).await.unwrap();
    assert_eq!(report.reclaimed, 1);
    assert_eq!(report.promoted, 0);
    assert_eq!(h.entry_status(third.id).await, WaitlistStatus::Expired);
    assert_eq!(h.slot_state(slot_id).await.status, SlotStatus::Available);
}

/// Time preferences act as a secondary filter at promotion time: a
/// mismatched entry is skipped and stays waiting.
#[tokio::test]
async fn promotion_skips_time_mismatched_entries() {
    let h = harness(SessionConfig::default()).await;
    let slot_id = h.slots[0].id; // starts at 08:00

    h.holds.place_hold(slot_id, ALICE, t(0)).await.unwrap();
    let booking = h.confirmer.confirm(slot_id, ALICE, None, t(1)).await.unwrap();

    let afternoon_only = h
        .join_waitlist_at("afternoon@example.com", true, vec!["14:".into()], t(2))
        .await;
    let flexible = h.join_waitlist_at("flexible@example.com", true, vec![], t(3)).await;

    h.confirmer.cancel(booking.id, t(5)).await.unwrap();

    assert_eq!(
        h.entry_status(afternoon_only.id).await,
        WaitlistStatus::Waiting,
        "mismatched entry must be skipped, not consumed"
    );
    assert_eq!(h.entry_status(flexible.id).await, WaitlistStatus::Notified);
}

/// Waitlist disabled on the session: a release promotes nobody.
#[tokio::test]
async fn no_promotion_when_waitlist_disabled() {
    let h = harness(SessionConfig {
        allow_waitlist: false,
        ..SessionConfig::default()
    })
    .await;
    let slot_id = h.slots[0].id;

    h.holds.place_hold(slot_id, ALICE, t(0)).await.unwrap();

    let report = h.sweeper.sweep(t(6)).await.unwrap();
    assert_eq!(report.reclaimed, 1);
    assert_eq!(report.promoted, 0);
    assert_eq!(h.slot_state(slot_id).await.status, SlotStatus::Available);
}
