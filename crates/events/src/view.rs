use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use eventdesk_auth::UserSummary;
use eventdesk_core::{EventId, UserId};

use crate::Event;

/// Read-side shape of an event with user references expanded.
///
/// `organizer` is `None` only if the referenced user record is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventView {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub organizer: Option<UserSummary>,
    pub participants: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventView {
    /// Join an event against already-loaded user summaries.
    ///
    /// Participants whose user record cannot be found are dropped.
    pub fn project(event: Event, users: &HashMap<UserId, UserSummary>) -> Self {
        let organizer = users.get(&event.organizer).cloned();
        let participants = event
            .participants
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect();

        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            date: event.date,
            time: event.time,
            organizer,
            participants,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }

    pub fn participant_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.participants.iter().map(|p| p.id)
    }
}

/// Every user id an event refers to (organizer first).
pub fn referenced_users(event: &Event) -> impl Iterator<Item = UserId> + '_ {
    std::iter::once(event.organizer).chain(event.participants.iter().copied())
}
