use std::sync::Arc;

use chrono::{DateTime, Utc};
use shutterbook_domain::{
    BookGuard, Booking, BookingRepository, ChargeRequest, EngineError, NewBooking, Notifier,
    PaymentProvider, SessionRepository, Slot, SlotRepository, SlotStatus,
};
use uuid::Uuid;

use crate::waitlist::WaitlistCoordinator;

/// Converts a valid hold into a permanent booking, exactly once. The
/// slot transition and the booking insert ride one store transaction;
/// the losing side of a concurrent confirm observes `SlotUnavailable`.
pub struct BookingConfirmer {
    slots: Arc<dyn SlotRepository>,
    sessions: Arc<dyn SessionRepository>,
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentProvider>,
    notifier: Arc<dyn Notifier>,
    waitlist: Arc<WaitlistCoordinator>,
}

impl BookingConfirmer {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        sessions: Arc<dyn SessionRepository>,
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn Notifier>,
        waitlist: Arc<WaitlistCoordinator>,
    ) -> Self {
        Self {
            slots,
            sessions,
            bookings,
            payments,
            notifier,
            waitlist,
        }
    }

    /// Confirm a slot for `contact`. Either the contact owns a live hold
    /// on the slot, or the session is auto-confirm and the slot is open
    /// (direct booking with no hold step).
    ///
    /// A declined payment returns `PaymentFailed` and leaves the hold
    /// exactly as it was: the holder may retry within the TTL, which is
    /// not extended.
    pub async fn confirm(
        &self,
        slot_id: Uuid,
        contact: &str,
        contact_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Booking, EngineError> {
        let slot = self.slots.get(slot_id).await?;
        let date = self.sessions.get_date(slot.session_date_id).await?;
        let session = self.sessions.get_session(date.mini_session_id).await?;

        let guard = if session.auto_confirm && slot.status != SlotStatus::Booked
            && !slot.held_live_by(contact, now)
        {
            BookGuard::AutoConfirm
        } else {
            BookGuard::HeldBy(contact.to_string())
        };

        // Fail fast before taking payment. The conditional write below
        // is still the authority; this only avoids charging a caller
        // whose claim is already dead.
        match &guard {
            BookGuard::HeldBy(c) => {
                if !slot.held_live_by(c, now) {
                    return Err(slot.deny_confirm(c, now));
                }
            }
            BookGuard::AutoConfirm => {
                if !slot.holdable(now) {
                    return Err(slot.deny_hold());
                }
            }
        }

        // External payment step. Only sessions with a deposit gate call
        // out; the hold is untouched on failure.
        let (payment_reference, amount_paid) = if session.requires_payment() {
            let result = self
                .payments
                .charge(&ChargeRequest {
                    slot_id,
                    contact_email: contact.to_string(),
                    amount: session.deposit_amount,
                    currency: session.currency.clone(),
                })
                .await?;
            if !result.succeeded() {
                return Err(EngineError::PaymentFailed {
                    reason: result
                        .failure_reason
                        .unwrap_or_else(|| "declined by provider".into()),
                });
            }
            (result.reference, session.deposit_amount)
        } else {
            (None, 0)
        };

        let booking = self
            .bookings
            .confirm(
                NewBooking {
                    id: Uuid::new_v4(),
                    slot_id,
                    contact_email: contact.to_string(),
                    contact_name,
                    payment_reference,
                    amount_paid,
                    currency: session.currency.clone(),
                },
                guard,
                now,
            )
            .await?;

        tracing::info!(booking_id = %booking.id, %slot_id, contact, "booking confirmed");
        self.notifier.booking_confirmed(&booking).await;

        // A promoted visitor completing their booking closes out the
        // waitlist entry behind the promotional hold.
        if let Some(entry) = self.waitlist.notified_entry_for(&slot, contact).await? {
            self.waitlist.convert(entry.id, booking.id).await?;
        }

        Ok(booking)
    }

    /// Reverse a booking: the row is marked cancelled (kept for audit),
    /// the slot goes back to available, and the waitlist gets its
    /// release notification.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Booking, Slot), EngineError> {
        let (booking, slot) = self.bookings.cancel(booking_id, now).await?;
        tracing::info!(%booking_id, slot_id = %slot.id, "booking cancelled");
        self.notifier.booking_cancelled(&booking).await;

        self.waitlist.on_slot_released(&slot, now).await?;
        Ok((booking, slot))
    }
}
