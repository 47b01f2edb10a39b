use async_trait::async_trait;

use crate::booking::Booking;
use crate::slot::Slot;
use crate::waitlist::WaitlistEntry;

/// Outbound notification channel (email/SMS transport is out of scope;
/// the engine only signals the transitions that warrant a message).
/// Delivery failures must not fail the transition that triggered them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn booking_confirmed(&self, booking: &Booking);
    async fn booking_cancelled(&self, booking: &Booking);
    async fn waitlist_promoted(&self, entry: &WaitlistEntry, slot: &Slot);
}

/// No-op channel for tests and wiring without a transport.
#[derive(Debug, Default, Clone)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn booking_confirmed(&self, _booking: &Booking) {}
    async fn booking_cancelled(&self, _booking: &Booking) {}
    async fn waitlist_promoted(&self, _entry: &WaitlistEntry, _slot: &Slot) {}
}
