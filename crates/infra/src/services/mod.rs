//! Application services: the operations behind each HTTP route.
//!
//! Services own the guard clauses (existence, ownership, duplicates) and talk to
//! the store traits; they know nothing about HTTP.

use thiserror::Error;

use eventdesk_core::DomainError;

use crate::store::StoreError;

pub mod auth;
pub mod events;

pub use auth::{AuthService, LoginToken, RegisteredUser};
pub use events::EventService;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Expected, user-facing failure.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Unexpected failure (hashing, signing, task join). Never shown to clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            _ => None,
        }
    }
}
