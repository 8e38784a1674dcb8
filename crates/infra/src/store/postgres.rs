//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError / outcome |
//! |------------|----------------------|----------------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (foreign key violation) on participant insert | `23503` | `AddParticipant::EventMissing` |
//! | Anything else | any | `Backend` |
//!
//! ## Registration atomicity
//!
//! Participants live in `event_participants` keyed by `(event_id, user_id)`, so
//! registration is a single `INSERT ... ON CONFLICT DO NOTHING`. Two concurrent
//! requests for the same user cannot both succeed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use eventdesk_auth::{Role, User, UserSummary};
use eventdesk_core::{EventId, UserId};
use eventdesk_events::{Event, EventView, referenced_users};

use super::{AddParticipant, EventStore, StoreError, StoreResult, UserStore, project_all};
use crate::config::DatabaseConfig;

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const EVENT_COLUMNS: &str =
    "id, title, description, date, time, organizer_id, created_at, updated_at";

/// Postgres-backed users + events store.
///
/// Uses the SQLx connection pool, which is `Send + Sync` and cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool for `config`.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        tracing::info!("database schema is up to date");
        Ok(())
    }

    async fn participants_of(&self, event_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<UserId>>> {
        let rows = sqlx::query(
            r#"
            SELECT event_id, user_id
            FROM event_participants
            WHERE event_id = ANY($1)
            ORDER BY seq ASC
            "#,
        )
        .bind(event_ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("participants_of", e))?;

        let mut by_event: HashMap<Uuid, Vec<UserId>> = HashMap::new();
        for row in rows {
            let event_id: Uuid = get(&row, "event_id", "participants_of")?;
            let user_id: Uuid = get(&row, "user_id", "participants_of")?;
            by_event.entry(event_id).or_default().push(UserId::from_uuid(user_id));
        }
        Ok(by_event)
    }

    async fn summaries(&self, ids: Vec<Uuid>) -> StoreResult<HashMap<UserId, UserSummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query("SELECT id, name, email FROM users WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("summaries", e))?;

        rows.iter()
            .map(|row| -> StoreResult<(UserId, UserSummary)> {
                let id = UserId::from_uuid(get(row, "id", "summaries")?);
                Ok((
                    id,
                    UserSummary {
                        id,
                        name: get(row, "name", "summaries")?,
                        email: get(row, "email", "summaries")?,
                    },
                ))
            })
            .collect()
    }

    async fn load_events(&self, rows: Vec<PgRow>, operation: &'static str) -> StoreResult<Vec<Event>> {
        let ids = rows
            .iter()
            .map(|row| get::<Uuid>(row, "id", operation))
            .collect::<StoreResult<Vec<_>>>()?;
        let mut participants = self.participants_of(&ids).await?;

        rows.iter()
            .map(|row| {
                let id: Uuid = get(row, "id", operation)?;
                event_from_row(row, participants.remove(&id).unwrap_or_default(), operation)
            })
            .collect()
    }

    async fn project(&self, events: Vec<Event>) -> StoreResult<Vec<EventView>> {
        let mut ids: Vec<Uuid> = events
            .iter()
            .flat_map(referenced_users)
            .map(Uuid::from)
            .collect();
        ids.sort();
        ids.dedup();

        let users = self.summaries(ids).await?;
        Ok(project_all(events, &users))
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_id", e))?;

        row.as_ref().map(|r| user_from_row(r, "find_user_by_id")).transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        row.as_ref().map(|r| user_from_row(r, "find_user_by_email")).transpose()
    }
}

#[async_trait]
impl EventStore for PostgresStore {
    #[instrument(skip(self, event), fields(event_id = %event.id), err)]
    async fn insert_event(&self, event: Event) -> StoreResult<Event> {
        sqlx::query(
            r#"
            INSERT INTO events (id, title, description, date, time, organizer_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.time)
        .bind(event.organizer.as_uuid())
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_event", e))?;

        Ok(event)
    }

    #[instrument(skip(self), fields(event_id = %id), err)]
    async fn find_event(&self, id: EventId) -> StoreResult<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_event", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.load_events(vec![row], "find_event").await?.pop())
    }

    #[instrument(skip(self), fields(event_id = %id), err)]
    async fn find_event_view(&self, id: EventId) -> StoreResult<Option<EventView>> {
        let Some(event) = self.find_event(id).await? else {
            return Ok(None);
        };
        Ok(self.project(vec![event]).await?.pop())
    }

    #[instrument(skip(self), fields(event_count = tracing::field::Empty), err)]
    async fn list_event_views(&self) -> StoreResult<Vec<EventView>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_event_views", e))?;

        let events = self.load_events(rows, "list_event_views").await?;
        tracing::Span::current().record("event_count", events.len());
        self.project(events).await
    }

    #[instrument(skip(self, event), fields(event_id = %event.id), err)]
    async fn update_event(&self, event: &Event) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = $2, description = $3, date = $4, time = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.time)
        .bind(event.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_event", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(event_id = %id, user_id = %user_id), err)]
    async fn add_participant(&self, id: EventId, user_id: UserId) -> StoreResult<AddParticipant> {
        let result = sqlx::query(
            r#"
            INSERT INTO event_participants (event_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (event_id, user_id) DO NOTHING
            "#,
        )
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .execute(&*self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(AddParticipant::AlreadyPresent),
            Ok(_) => Ok(AddParticipant::Added),
            Err(e) if is_foreign_key_violation(&e) => Ok(AddParticipant::EventMissing),
            Err(e) => Err(map_sqlx_error("add_participant", e)),
        }
    }

    #[instrument(skip(self), fields(event_id = %id), err)]
    async fn delete_event(&self, id: EventId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_event", e))?;

        Ok(result.rows_affected() > 0)
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str, operation: &'static str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get::<T, _>(column)
        .map_err(|e| StoreError::backend(operation, format!("failed to read column {column}: {e}")))
}

fn user_from_row(row: &PgRow, operation: &'static str) -> StoreResult<User> {
    let role: String = get(row, "role", operation)?;
    let role = Role::parse(&role)
        .ok_or_else(|| StoreError::backend(operation, format!("unknown role {role:?}")))?;

    Ok(User {
        id: UserId::from_uuid(get(row, "id", operation)?),
        name: get(row, "name", operation)?,
        email: get(row, "email", operation)?,
        password_hash: get(row, "password_hash", operation)?,
        role,
        created_at: get::<DateTime<Utc>>(row, "created_at", operation)?,
    })
}

fn event_from_row(row: &PgRow, participants: Vec<UserId>, operation: &'static str) -> StoreResult<Event> {
    Ok(Event {
        id: EventId::from_uuid(get(row, "id", operation)?),
        title: get(row, "title", operation)?,
        description: get(row, "description", operation)?,
        date: get::<NaiveDate>(row, "date", operation)?,
        time: get(row, "time", operation)?,
        organizer: UserId::from_uuid(get(row, "organizer_id", operation)?),
        participants,
        created_at: get::<DateTime<Utc>>(row, "created_at", operation)?,
        updated_at: get::<DateTime<Utc>>(row, "updated_at", operation)?,
    })
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23503"),
        _ => false,
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                StoreError::Duplicate(db_err.constraint().unwrap_or("unique key").to_string())
            } else {
                StoreError::backend(operation, db_err.message().to_string())
            }
        }
        sqlx::Error::PoolClosed => StoreError::backend(operation, "connection pool closed"),
        other => StoreError::backend(operation, other.to_string()),
    }
}
