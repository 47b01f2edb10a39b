use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use shutterbook_domain::{EngineError, WaitlistEntry, WaitlistRepository, WaitlistStatus};

use crate::db_err;

pub struct PgWaitlistRepository {
    pool: PgPool,
}

impl PgWaitlistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct WaitlistRow {
    id: Uuid,
    mini_session_id: Uuid,
    session_date_id: Option<Uuid>,
    contact_email: String,
    contact_name: Option<String>,
    preferred_times: Vec<String>,
    status: String,
    notified_at: Option<DateTime<Utc>>,
    converted_booking_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl WaitlistRow {
    fn into_entry(self) -> Result<WaitlistEntry, EngineError> {
        let status = WaitlistStatus::parse(&self.status).ok_or_else(|| {
            EngineError::Storage(format!("unknown waitlist status '{}'", self.status))
        })?;
        Ok(WaitlistEntry {
            id: self.id,
            mini_session_id: self.mini_session_id,
            session_date_id: self.session_date_id,
            contact_email: self.contact_email,
            contact_name: self.contact_name,
            preferred_times: self.preferred_times,
            status,
            notified_at: self.notified_at,
            converted_booking_id: self.converted_booking_id,
            created_at: self.created_at,
        })
    }
}

const WAITLIST_COLUMNS: &str = "id, mini_session_id, session_date_id, contact_email, contact_name, preferred_times, status, notified_at, converted_booking_id, created_at";

#[async_trait]
impl WaitlistRepository for PgWaitlistRepository {
    async fn insert(&self, entry: WaitlistEntry) -> Result<WaitlistEntry, EngineError> {
        sqlx::query(
            r#"
            INSERT INTO waitlist_entries (id, mini_session_id, session_date_id, contact_email, contact_name, preferred_times, status, notified_at, converted_booking_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id)
        .bind(entry.mini_session_id)
        .bind(entry.session_date_id)
        .bind(&entry.contact_email)
        .bind(&entry.contact_name)
        .bind(&entry.preferred_times)
        .bind(entry.status.as_str())
        .bind(entry.notified_at)
        .bind(entry.converted_booking_id)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(entry)
    }

    async fn get(&self, entry_id: Uuid) -> Result<WaitlistEntry, EngineError> {
        let row = sqlx::query_as::<_, WaitlistRow>(&format!(
            "SELECT {WAITLIST_COLUMNS} FROM waitlist_entries WHERE id = $1"
        ))
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| EngineError::not_found("waitlist_entry", entry_id))?
            .into_entry()
    }

    async fn waiting_for_date(
        &self,
        mini_session_id: Uuid,
        session_date_id: Uuid,
    ) -> Result<Vec<WaitlistEntry>, EngineError> {
        // Date-scoped entries for this date plus session-wide entries,
        // first come first served.
        let rows = sqlx::query_as::<_, WaitlistRow>(&format!(
            r#"
            SELECT {WAITLIST_COLUMNS} FROM waitlist_entries
            WHERE mini_session_id = $1
              AND status = 'waiting'
              AND (session_date_id IS NULL OR session_date_id = $2)
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(mini_session_id)
        .bind(session_date_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(WaitlistRow::into_entry).collect()
    }

    async fn mark_notified(&self, entry_id: Uuid, now: DateTime<Utc>) -> Result<bool, EngineError> {
        let result = sqlx::query(
            "UPDATE waitlist_entries SET status = 'notified', notified_at = $2 WHERE id = $1 AND status = 'waiting'",
        )
        .bind(entry_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_expired(&self, entry_id: Uuid) -> Result<bool, EngineError> {
        let result = sqlx::query(
            "UPDATE waitlist_entries SET status = 'expired' WHERE id = $1 AND status = 'notified'",
        )
        .bind(entry_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_converted(
        &self,
        entry_id: Uuid,
        booking_id: Uuid,
    ) -> Result<bool, EngineError> {
        let result = sqlx::query(
            "UPDATE waitlist_entries SET status = 'converted', converted_booking_id = $2 WHERE id = $1 AND status = 'notified'",
        )
        .bind(entry_id)
        .bind(booking_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_notified(
        &self,
        mini_session_id: Uuid,
        session_date_id: Uuid,
        contact: &str,
    ) -> Result<Option<WaitlistEntry>, EngineError> {
        let row = sqlx::query_as::<_, WaitlistRow>(&format!(
            r#"
            SELECT {WAITLIST_COLUMNS} FROM waitlist_entries
            WHERE mini_session_id = $1
              AND status = 'notified'
              AND contact_email = $3
              AND (session_date_id IS NULL OR session_date_id = $2)
            ORDER BY notified_at ASC
            LIMIT 1
            "#
        ))
        .bind(mini_session_id)
        .bind(session_date_id)
        .bind(contact)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(WaitlistRow::into_entry).transpose()
    }
}
