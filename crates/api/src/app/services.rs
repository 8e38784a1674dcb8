//! Service wiring: one store backend shared by auth, events and the auth
//! middleware.

use std::sync::Arc;

use eventdesk_auth::Hs256Jwt;
use eventdesk_infra::{
    AppConfig, AuthService, EventService, EventStore, InMemoryStore, PostgresStore, StoreResult, UserStore,
};

use crate::middleware::AuthState;

pub struct AppServices {
    pub auth: AuthService,
    pub events: EventService,
    auth_state: AuthState,
}

impl AppServices {
    /// Wire services over any backend implementing both store traits.
    pub fn with_store<S>(config: &AppConfig, store: Arc<S>) -> Self
    where
        S: UserStore + EventStore + 'static,
    {
        let jwt = Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes(), config.token_ttl));
        let users: Arc<dyn UserStore> = store.clone();
        let events: Arc<dyn EventStore> = store;

        Self {
            auth: AuthService::new(users.clone(), jwt.clone(), config.bcrypt_cost),
            events: EventService::new(events),
            auth_state: AuthState { tokens: jwt, users },
        }
    }

    pub fn in_memory(config: &AppConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryStore::new()))
    }

    /// Postgres when `DATABASE_URL` is configured, otherwise in-memory.
    pub async fn from_config(config: &AppConfig) -> StoreResult<Self> {
        match &config.database {
            Some(db) => {
                let store = PostgresStore::connect(db).await?;
                store.migrate().await?;
                tracing::info!(max_connections = db.max_connections, "using postgres store");
                Ok(Self::with_store(config, Arc::new(store)))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; data lives in memory only");
                Ok(Self::in_memory(config))
            }
        }
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth_state.clone()
    }
}
