use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use eventdesk_auth::{User, UserSummary};
use eventdesk_core::{Entity, EventId, UserId};
use eventdesk_events::{Event, EventView, referenced_users};

use super::{AddParticipant, EventStore, StoreError, StoreResult, UserStore, project_all};

/// In-memory users + events collections.
///
/// Intended for tests/dev. Both traits live on one struct so event views can
/// join against the users map. Locks are never held across an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    events: RwLock<HashMap<EventId, Event>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn summaries(
        &self,
        ids: impl Iterator<Item = UserId>,
    ) -> StoreResult<HashMap<UserId, UserSummary>> {
        let users = self.users.read().map_err(|_| poisoned("summaries"))?;
        Ok(ids
            .filter_map(|id| users.get(&id).map(|u| (id, u.summary())))
            .collect())
    }
}

fn poisoned(operation: &'static str) -> StoreError {
    StoreError::backend(operation, "lock poisoned")
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().map_err(|_| poisoned("insert_user"))?;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("users.email".to_string()));
        }
        users.insert(user.id(), user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let users = self.users.read().map_err(|_| poisoned("find_user_by_id"))?;
        Ok(users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().map_err(|_| poisoned("find_user_by_email"))?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn insert_event(&self, event: Event) -> StoreResult<Event> {
        let mut events = self.events.write().map_err(|_| poisoned("insert_event"))?;
        events.insert(event.id(), event.clone());
        Ok(event)
    }

    async fn find_event(&self, id: EventId) -> StoreResult<Option<Event>> {
        let events = self.events.read().map_err(|_| poisoned("find_event"))?;
        Ok(events.get(&id).cloned())
    }

    async fn find_event_view(&self, id: EventId) -> StoreResult<Option<EventView>> {
        let Some(event) = self.find_event(id).await? else {
            return Ok(None);
        };
        let users = self.summaries(referenced_users(&event))?;
        Ok(Some(EventView::project(event, &users)))
    }

    async fn list_event_views(&self) -> StoreResult<Vec<EventView>> {
        let mut events: Vec<Event> = {
            let events = self.events.read().map_err(|_| poisoned("list_event_views"))?;
            events.values().cloned().collect()
        };
        events.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let users = self.summaries(events.iter().flat_map(referenced_users))?;
        Ok(project_all(events, &users))
    }

    async fn update_event(&self, event: &Event) -> StoreResult<bool> {
        let mut events = self.events.write().map_err(|_| poisoned("update_event"))?;
        let Some(stored) = events.get_mut(&event.id()) else {
            return Ok(false);
        };
        stored.title = event.title.clone();
        stored.description = event.description.clone();
        stored.date = event.date;
        stored.time = event.time.clone();
        stored.updated_at = event.updated_at;
        Ok(true)
    }

    async fn add_participant(&self, id: EventId, user_id: UserId) -> StoreResult<AddParticipant> {
        let mut events = self.events.write().map_err(|_| poisoned("add_participant"))?;
        let Some(event) = events.get_mut(&id) else {
            return Ok(AddParticipant::EventMissing);
        };
        if event.has_participant(user_id) {
            return Ok(AddParticipant::AlreadyPresent);
        }
        event.participants.push(user_id);
        Ok(AddParticipant::Added)
    }

    async fn delete_event(&self, id: EventId) -> StoreResult<bool> {
        let mut events = self.events.write().map_err(|_| poisoned("delete_event"))?;
        Ok(events.remove(&id).is_some())
    }
}
