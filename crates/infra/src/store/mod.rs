//! Data store: the Users and Events collections.
//!
//! Two backends implement both traits:
//! - [`InMemoryStore`]: tests/dev, and the fallback when no database is configured.
//! - [`PostgresStore`]: sqlx + PostgreSQL.
//!
//! Reads that expand user references return [`EventView`]; the join happens here,
//! not in the services.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use eventdesk_auth::{User, UserSummary};
use eventdesk_core::{EventId, UserId};
use eventdesk_events::{Event, EventView};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operation error.
///
/// These are infrastructure failures; "not found" is expressed as `Ok(None)`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("store failure in {operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: message.into(),
        }
    }
}

/// Outcome of the atomic add-if-absent participant write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddParticipant {
    Added,
    AlreadyPresent,
    EventMissing,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user. Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn insert_user(&self, user: User) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Lookup by normalized (trimmed, lowercased) email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, event: Event) -> StoreResult<Event>;

    async fn find_event(&self, id: EventId) -> StoreResult<Option<Event>>;

    async fn find_event_view(&self, id: EventId) -> StoreResult<Option<EventView>>;

    /// All events, oldest first, with references expanded.
    async fn list_event_views(&self) -> StoreResult<Vec<EventView>>;

    /// Overwrite the editable fields (title, description, date, time, updated_at).
    ///
    /// Returns `false` if the event no longer exists.
    async fn update_event(&self, event: &Event) -> StoreResult<bool>;

    /// Append `user_id` to the participants unless already present, atomically.
    async fn add_participant(&self, id: EventId, user_id: UserId) -> StoreResult<AddParticipant>;

    /// Delete by id. Returns `false` if nothing was removed.
    async fn delete_event(&self, id: EventId) -> StoreResult<bool>;
}

/// Build views for `events` given the summaries of every referenced user.
pub(crate) fn project_all(
    events: Vec<Event>,
    users: &HashMap<UserId, UserSummary>,
) -> Vec<EventView> {
    events
        .into_iter()
        .map(|event| EventView::project(event, users))
        .collect()
}
