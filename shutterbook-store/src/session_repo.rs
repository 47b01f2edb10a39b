use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use shutterbook_domain::{EngineError, MiniSession, SessionDate, SessionRepository};

use crate::db_err;

pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct MiniSessionRow {
    id: Uuid,
    owner_id: String,
    name: String,
    description: Option<String>,
    duration_minutes: i32,
    buffer_minutes: i32,
    price: i64,
    deposit_amount: i64,
    currency: String,
    capacity_per_slot: i32,
    allow_waitlist: bool,
    auto_confirm: bool,
    published: bool,
    hold_ttl_minutes: Option<i64>,
    location: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MiniSessionRow> for MiniSession {
    fn from(r: MiniSessionRow) -> Self {
        MiniSession {
            id: r.id,
            owner_id: r.owner_id,
            name: r.name,
            description: r.description,
            duration_minutes: r.duration_minutes,
            buffer_minutes: r.buffer_minutes,
            price: r.price,
            deposit_amount: r.deposit_amount,
            currency: r.currency,
            capacity_per_slot: r.capacity_per_slot,
            allow_waitlist: r.allow_waitlist,
            auto_confirm: r.auto_confirm,
            published: r.published,
            hold_ttl_minutes: r.hold_ttl_minutes,
            location: r.location,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionDateRow {
    id: Uuid,
    mini_session_id: Uuid,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    location_override: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SessionDateRow> for SessionDate {
    fn from(r: SessionDateRow) -> Self {
        SessionDate {
            id: r.id,
            mini_session_id: r.mini_session_id,
            start_at: r.start_at,
            end_at: r.end_at,
            location_override: r.location_override,
            created_at: r.created_at,
        }
    }
}

const SESSION_COLUMNS: &str = "id, owner_id, name, description, duration_minutes, buffer_minutes, price, deposit_amount, currency, capacity_per_slot, allow_waitlist, auto_confirm, published, hold_ttl_minutes, location, created_at, updated_at";

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create_session(&self, session: MiniSession) -> Result<MiniSession, EngineError> {
        sqlx::query(
            r#"
            INSERT INTO mini_sessions (id, owner_id, name, description, duration_minutes, buffer_minutes, price, deposit_amount, currency, capacity_per_slot, allow_waitlist, auto_confirm, published, hold_ttl_minutes, location, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(session.id)
        .bind(&session.owner_id)
        .bind(&session.name)
        .bind(&session.description)
        .bind(session.duration_minutes)
        .bind(session.buffer_minutes)
        .bind(session.price)
        .bind(session.deposit_amount)
        .bind(&session.currency)
        .bind(session.capacity_per_slot)
        .bind(session.allow_waitlist)
        .bind(session.auto_confirm)
        .bind(session.published)
        .bind(session.hold_ttl_minutes)
        .bind(&session.location)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> Result<MiniSession, EngineError> {
        let row = sqlx::query_as::<_, MiniSessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM mini_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(MiniSession::from)
            .ok_or_else(|| EngineError::not_found("mini_session", id))
    }

    async fn create_date(&self, date: SessionDate) -> Result<SessionDate, EngineError> {
        sqlx::query(
            r#"
            INSERT INTO session_dates (id, mini_session_id, start_at, end_at, location_override, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(date.id)
        .bind(date.mini_session_id)
        .bind(date.start_at)
        .bind(date.end_at)
        .bind(&date.location_override)
        .bind(date.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(date)
    }

    async fn get_date(&self, id: Uuid) -> Result<SessionDate, EngineError> {
        let row = sqlx::query_as::<_, SessionDateRow>(
            "SELECT id, mini_session_id, start_at, end_at, location_override, created_at FROM session_dates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(SessionDate::from)
            .ok_or_else(|| EngineError::not_found("session_date", id))
    }
}
