use std::sync::Arc;

use chrono::Utc;

use eventdesk_core::{DomainError, EventId, UserId};
use eventdesk_events::{Event, EventDetails, EventPatch, EventView, OwnerAction, already_registered};

use super::ServiceResult;
use crate::store::{AddParticipant, EventStore};

fn event_not_found() -> DomainError {
    DomainError::not_found("Event")
}

/// Event CRUD plus participant registration.
#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(events: Arc<dyn EventStore>) -> Self {
        Self { events }
    }

    pub async fn create_event(&self, details: EventDetails, organizer: UserId) -> ServiceResult<Event> {
        let event = Event::create(details, organizer, Utc::now());
        let event = self.events.insert_event(event).await?;
        tracing::info!(event_id = %event.id, organizer = %organizer, "event created");
        Ok(event)
    }

    pub async fn register_for_event(&self, user_id: UserId, event_id: EventId) -> ServiceResult<EventView> {
        let event = self.events.find_event(event_id).await?.ok_or_else(event_not_found)?;
        event.ensure_can_register(user_id)?;

        match self.events.add_participant(event_id, user_id).await? {
            AddParticipant::Added => {}
            AddParticipant::AlreadyPresent => return Err(already_registered().into()),
            AddParticipant::EventMissing => return Err(event_not_found().into()),
        }
        tracing::info!(event_id = %event_id, user_id = %user_id, "participant registered");

        self.view(event_id).await
    }

    pub async fn get_all_events(&self) -> ServiceResult<Vec<EventView>> {
        Ok(self.events.list_event_views().await?)
    }

    pub async fn get_event_by_id(&self, event_id: EventId) -> ServiceResult<EventView> {
        self.view(event_id).await
    }

    pub async fn update_event(
        &self,
        event_id: EventId,
        patch: EventPatch,
        user_id: UserId,
    ) -> ServiceResult<EventView> {
        let mut event = self.events.find_event(event_id).await?.ok_or_else(event_not_found)?;
        event.ensure_organizer(user_id, OwnerAction::Update)?;

        event.apply_patch(&patch, Utc::now());
        if !self.events.update_event(&event).await? {
            return Err(event_not_found().into());
        }
        tracing::info!(event_id = %event_id, "event updated");

        self.view(event_id).await
    }

    /// Returns the record as it was before removal.
    pub async fn delete_event(&self, event_id: EventId, user_id: UserId) -> ServiceResult<Event> {
        let event = self.events.find_event(event_id).await?.ok_or_else(event_not_found)?;
        event.ensure_organizer(user_id, OwnerAction::Delete)?;

        if !self.events.delete_event(event_id).await? {
            return Err(event_not_found().into());
        }
        tracing::info!(event_id = %event_id, "event deleted");
        Ok(event)
    }

    async fn view(&self, event_id: EventId) -> ServiceResult<EventView> {
        Ok(self
            .events
            .find_event_view(event_id)
            .await?
            .ok_or_else(event_not_found)?)
    }
}
