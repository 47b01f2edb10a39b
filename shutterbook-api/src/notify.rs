use async_trait::async_trait;

use shutterbook_domain::{Booking, Notifier, Slot, WaitlistEntry};

/// Notification channel that records the transition in the log stream.
/// The real email/SMS transport sits behind the same trait and is out
/// of scope here.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn booking_confirmed(&self, booking: &Booking) {
        tracing::info!(
            booking_id = %booking.id,
            contact = %booking.contact_email,
            "notify: booking confirmed"
        );
    }

    async fn booking_cancelled(&self, booking: &Booking) {
        tracing::info!(
            booking_id = %booking.id,
            contact = %booking.contact_email,
            "notify: booking cancelled"
        );
    }

    async fn waitlist_promoted(&self, entry: &WaitlistEntry, slot: &Slot) {
        tracing::info!(
            entry_id = %entry.id,
            contact = %entry.contact_email,
            slot_id = %slot.id,
            held_until = ?slot.held_until,
            "notify: waitlist spot opened"
        );
    }
}
