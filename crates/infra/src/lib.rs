//! Infrastructure layer: configuration, storage backends, application services.

pub mod config;
pub mod services;
pub mod store;

pub use config::{AppConfig, ConfigError, DatabaseConfig};
pub use services::{AuthService, EventService, ServiceError, ServiceResult};
pub use store::{AddParticipant, EventStore, InMemoryStore, PostgresStore, StoreError, StoreResult, UserStore};
