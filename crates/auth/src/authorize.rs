use thiserror::Error;

use crate::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Access denied. Insufficient permissions")]
    Forbidden { role: Role },
}

/// Check that `role` is one of `allowed`.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize_role(role: Role, allowed: &[Role]) -> Result<(), AuthzError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden { role })
    }
}
