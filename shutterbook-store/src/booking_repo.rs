use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use shutterbook_domain::{
    BookGuard, Booking, BookingRepository, BookingStatus, EngineError, NewBooking, Slot,
};

use crate::db_err;
use crate::slot_repo::{SlotRow, SLOT_COLUMNS};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_slot(&self, slot_id: Uuid) -> Result<Slot, EngineError> {
        let row = sqlx::query_as::<_, SlotRow>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slots WHERE id = $1"
        ))
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| EngineError::not_found("slot", slot_id))?
            .into_slot()
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    slot_id: Uuid,
    contact_email: String,
    contact_name: Option<String>,
    status: String,
    payment_reference: Option<String>,
    amount_paid: i64,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, EngineError> {
        let status = BookingStatus::parse(&self.status).ok_or_else(|| {
            EngineError::Storage(format!("unknown booking status '{}'", self.status))
        })?;
        Ok(Booking {
            id: self.id,
            slot_id: self.slot_id,
            contact_email: self.contact_email,
            contact_name: self.contact_name,
            status,
            payment_reference: self.payment_reference,
            amount_paid: self.amount_paid,
            currency: self.currency,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, slot_id, contact_email, contact_name, status, payment_reference, amount_paid, currency, created_at, updated_at";

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn confirm(
        &self,
        booking: NewBooking,
        guard: BookGuard,
        now: DateTime<Utc>,
    ) -> Result<Booking, EngineError> {
        let slot_id = booking.slot_id;
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // The slot transition and the booking insert commit together:
        // the losing side of two concurrent confirms sees zero rows
        // here and never reaches the insert.
        let transitioned = match &guard {
            BookGuard::HeldBy(contact) => sqlx::query(
                r#"
                UPDATE slots
                SET status = 'booked', booking_id = $2, held_by = NULL, held_until = NULL, updated_at = $4
                WHERE id = $1 AND status = 'held' AND held_by = $3 AND held_until > $4
                "#,
            )
            .bind(slot_id)
            .bind(booking.id)
            .bind(contact)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?,
            BookGuard::AutoConfirm => sqlx::query(
                r#"
                UPDATE slots
                SET status = 'booked', booking_id = $2, held_by = NULL, held_until = NULL, updated_at = $3
                WHERE id = $1
                  AND (status = 'available' OR (status = 'held' AND held_until <= $3))
                "#,
            )
            .bind(slot_id)
            .bind(booking.id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?,
        };

        if transitioned.rows_affected() != 1 {
            drop(tx);
            let current = self.fetch_slot(slot_id).await?;
            return Err(match &guard {
                BookGuard::HeldBy(contact) => current.deny_confirm(contact, now),
                BookGuard::AutoConfirm => current.deny_hold(),
            });
        }

        let persisted = booking.into_booking(now);
        sqlx::query(
            r#"
            INSERT INTO bookings (id, slot_id, contact_email, contact_name, status, payment_reference, amount_paid, currency, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(persisted.id)
        .bind(persisted.slot_id)
        .bind(&persisted.contact_email)
        .bind(&persisted.contact_name)
        .bind(persisted.status.as_str())
        .bind(&persisted.payment_reference)
        .bind(persisted.amount_paid)
        .bind(&persisted.currency)
        .bind(persisted.created_at)
        .bind(persisted.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(persisted)
    }

    async fn get(&self, booking_id: Uuid) -> Result<Booking, EngineError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| EngineError::not_found("booking", booking_id))?
            .into_booking()
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Booking>, EngineError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE payment_reference = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn cancel(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Booking, Slot), EngineError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Cancelled bookings are kept for audit, never deleted.
        let booking_row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = 'cancelled', updated_at = $2
            WHERE id = $1 AND status = 'confirmed'
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(booking_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let Some(booking_row) = booking_row else {
            drop(tx);
            // Distinguish "unknown booking" from "already cancelled".
            return match self.get(booking_id).await {
                Ok(_) => Err(EngineError::Validation {
                    field: "booking_id",
                    reason: "booking is already cancelled".into(),
                }),
                Err(e) => Err(e),
            };
        };
        let booking = booking_row.into_booking()?;

        let slot_row = sqlx::query_as::<_, SlotRow>(&format!(
            r#"
            UPDATE slots
            SET status = 'available', booking_id = NULL, updated_at = $3
            WHERE id = $1 AND status = 'booked' AND booking_id = $2
            RETURNING {SLOT_COLUMNS}
            "#
        ))
        .bind(booking.slot_id)
        .bind(booking_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let Some(slot_row) = slot_row else {
            // The booking row said confirmed but the slot disagrees;
            // roll everything back rather than guessing.
            tx.rollback().await.map_err(db_err)?;
            return Err(EngineError::Storage(format!(
                "slot {} out of sync with booking {}",
                booking.slot_id, booking_id
            )));
        };
        let slot = slot_row.into_slot()?;

        tx.commit().await.map_err(db_err)?;
        Ok((booking, slot))
    }
}
