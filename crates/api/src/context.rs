use eventdesk_auth::{Role, User};
use eventdesk_core::UserId;

/// Authenticated user for a request.
///
/// Inserted by the auth middleware and dropped with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    user: User,
}

impl UserContext {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}
