use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use eventdesk_core::{DomainError, DomainResult, Entity, EventId, UserId};

/// An event published by an organizer.
///
/// # Invariants
/// - `organizer` is set at creation and never changes.
/// - `organizer` never appears in `participants`.
/// - `participants` holds no duplicates and keeps registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub organizer: UserId,
    pub participants: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutations reserved for the organizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerAction {
    Update,
    Delete,
}

impl OwnerAction {
    fn as_str(&self) -> &'static str {
        match self {
            OwnerAction::Update => "update",
            OwnerAction::Delete => "delete",
        }
    }
}

impl Event {
    pub fn create(details: EventDetails, organizer: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: EventId::new(),
            title: details.title,
            description: details.description,
            date: details.date,
            time: details.time,
            organizer,
            participants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_organized_by(&self, user_id: UserId) -> bool {
        self.organizer == user_id
    }

    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participants.contains(&user_id)
    }

    pub fn ensure_organizer(&self, user_id: UserId, action: OwnerAction) -> DomainResult<()> {
        if self.is_organized_by(user_id) {
            Ok(())
        } else {
            Err(DomainError::forbidden(format!(
                "You are not authorized to {} this event",
                action.as_str()
            )))
        }
    }

    /// Guard for adding `user_id` to the participants.
    pub fn ensure_can_register(&self, user_id: UserId) -> DomainResult<()> {
        if self.is_organized_by(user_id) {
            return Err(DomainError::invariant(
                "Organizers cannot register as participants in their own events",
            ));
        }
        if self.has_participant(user_id) {
            return Err(already_registered());
        }
        Ok(())
    }

    /// Merge the present patch fields. Organizer and participants are untouched.
    pub fn apply_patch(&mut self, patch: &EventPatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(time) = &patch.time {
            self.time = time.clone();
        }
        self.updated_at = now;
    }
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> EventId {
        self.id
    }
}

/// Error returned when a user is already a participant.
pub fn already_registered() -> DomainError {
    DomainError::conflict("User already registered for this event")
}

/// Validated input for a new event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetails {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
}

impl EventDetails {
    pub fn new(title: &str, description: &str, date: &str, time: &str) -> DomainResult<Self> {
        Ok(Self {
            title: required("title", title)?,
            description: required("description", description)?,
            date: parse_event_date(date)?,
            time: required("time", time)?,
        })
    }
}

/// Partial update; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
}

impl EventPatch {
    pub fn new(
        title: Option<&str>,
        description: Option<&str>,
        date: Option<&str>,
        time: Option<&str>,
    ) -> DomainResult<Self> {
        Ok(Self {
            title: title.map(|v| required("title", v)).transpose()?,
            description: description.map(|v| required("description", v)).transpose()?,
            date: date.map(parse_event_date).transpose()?,
            time: time.map(|v| required("time", v)).transpose()?,
        })
    }
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Accepts a calendar date (`2025-03-14`) or an RFC 3339 timestamp, whose UTC
/// date is kept.
pub fn parse_event_date(raw: &str) -> DomainResult<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| DomainError::validation("date must be a valid date"))
}
