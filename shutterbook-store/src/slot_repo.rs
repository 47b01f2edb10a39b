use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use shutterbook_domain::{EngineError, Slot, SlotRepository, SlotStatus};

use crate::db_err;

pub struct PgSlotRepository {
    pool: PgPool,
}

impl PgSlotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
pub(crate) struct SlotRow {
    pub id: Uuid,
    pub session_date_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: String,
    pub booking_id: Option<Uuid>,
    pub held_until: Option<DateTime<Utc>>,
    pub held_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SlotRow {
    pub(crate) fn into_slot(self) -> Result<Slot, EngineError> {
        let status = SlotStatus::parse(&self.status)
            .ok_or_else(|| EngineError::Storage(format!("unknown slot status '{}'", self.status)))?;
        Ok(Slot {
            id: self.id,
            session_date_id: self.session_date_id,
            start_at: self.start_at,
            end_at: self.end_at,
            status,
            booking_id: self.booking_id,
            held_until: self.held_until,
            held_by: self.held_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub(crate) const SLOT_COLUMNS: &str =
    "id, session_date_id, start_at, end_at, status, booking_id, held_until, held_by, created_at, updated_at";

#[async_trait]
impl SlotRepository for PgSlotRepository {
    async fn get(&self, slot_id: Uuid) -> Result<Slot, EngineError> {
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

    async fn list_available(
        &self,
        session_date_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<Slot>, EngineError> {
        let rows = sqlx::query_as::<_, SlotRow>(&format!(
            r#"
            SELECT {SLOT_COLUMNS} FROM slots
            WHERE session_date_id = $1
              AND (status = 'available' OR (status = 'held' AND held_until < $2))
            ORDER BY start_at ASC, id ASC
            "#
        ))
        .bind(session_date_id)
        .bind(as_of)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(SlotRow::into_slot).collect()
    }

    async fn insert_slots(&self, slots: Vec<Slot>) -> Result<usize, EngineError> {
        if slots.is_empty() {
            return Ok(0);
        }

        // Re-running generation for a date must not create duplicates:
        // slot_index is deterministic per generation, and the unique
        // index on (session_date_id, start_at, slot_index) turns a
        // re-run into a pile of no-op conflicts.
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut inserted = 0usize;
        let mut slot_index = 0i32;
        let mut last_start: Option<DateTime<Utc>> = None;

        for slot in &slots {
            if last_start == Some(slot.start_at) {
                slot_index += 1;
            } else {
                slot_index = 0;
                last_start = Some(slot.start_at);
            }

            let result = sqlx::query(
                r#"
                INSERT INTO slots (id, session_date_id, start_at, end_at, status, slot_index, created_at, updated_at)
                VALUES ($1, $2, $3, $4, 'available', $5, $6, $7)
                ON CONFLICT (session_date_id, start_at, slot_index) DO NOTHING
                "#,
            )
            .bind(slot.id)
            .bind(slot.session_date_id)
            .bind(slot.start_at)
            .bind(slot.end_at)
            .bind(slot_index)
            .bind(slot.created_at)
            .bind(slot.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

            inserted += result.rows_affected() as usize;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(inserted)
    }

    async fn try_hold(
        &self,
        slot_id: Uuid,
        contact: &str,
        held_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Slot, EngineError> {
        // Single conditional write: a stale hold is stolen in the same
        // statement, so two racing callers cannot both win.
        let row = sqlx::query_as::<_, SlotRow>(&format!(
            r#"
            UPDATE slots
            SET status = 'held', held_by = $2, held_until = $3, updated_at = $4
            WHERE id = $1
              AND (status = 'available' OR (status = 'held' AND held_until <= $4))
            RETURNING {SLOT_COLUMNS}
            "#
        ))
        .bind(slot_id)
        .bind(contact)
        .bind(held_until)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(r) => r.into_slot(),
            None => {
                let current = self.get(slot_id).await?;
                Err(current.deny_hold())
            }
        }
    }

    async fn try_renew(
        &self,
        slot_id: Uuid,
        contact: &str,
        held_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Slot, EngineError> {
        let row = sqlx::query_as::<_, SlotRow>(&format!(
            r#"
            UPDATE slots
            SET held_until = $3, updated_at = $4
            WHERE id = $1 AND status = 'held' AND held_by = $2 AND held_until > $4
            RETURNING {SLOT_COLUMNS}
            "#
        ))
        .bind(slot_id)
        .bind(contact)
        .bind(held_until)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(r) => r.into_slot(),
            None => {
                let current = self.get(slot_id).await?;
                Err(current.deny_renew(contact, now))
            }
        }
    }

    async fn try_release(
        &self,
        slot_id: Uuid,
        contact: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Slot>, EngineError> {
        // Releasing is idempotent: no matching row is a no-op, not an
        // error.
        let row = sqlx::query_as::<_, SlotRow>(&format!(
            r#"
            UPDATE slots
            SET status = 'available', held_by = NULL, held_until = NULL, updated_at = $3
            WHERE id = $1 AND status = 'held' AND held_by = $2
            RETURNING {SLOT_COLUMNS}
            "#
        ))
        .bind(slot_id)
        .bind(contact)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(SlotRow::into_slot).transpose()
    }

    async fn expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<Slot>, EngineError> {
        let rows = sqlx::query_as::<_, SlotRow>(&format!(
            r#"
            SELECT {SLOT_COLUMNS} FROM slots
            WHERE status = 'held' AND held_until < $1
            ORDER BY held_until ASC
            "#
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(SlotRow::into_slot).collect()
    }

    async fn try_reclaim(
        &self,
        slot_id: Uuid,
        observed_held_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, EngineError> {
        // Keyed on the exact expiry the sweep observed: a hold renewed
        // between the scan and this write no longer matches and is left
        // alone.
        let result = sqlx::query(
            r#"
            UPDATE slots
            SET status = 'available', held_by = NULL, held_until = NULL, updated_at = $3
            WHERE id = $1 AND status = 'held' AND held_until = $2
            "#,
        )
        .bind(slot_id)
        .bind(observed_held_until)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() == 1)
    }
}
