//! API-side role guard.
//!
//! Routes declare which roles they accept; the check itself lives in
//! `eventdesk_auth` so it stays free of HTTP types.

use eventdesk_auth::{AuthzError, Role, authorize_role};

use crate::context::UserContext;

/// Only organizers may create or change events.
pub const ORGANIZER_ONLY: &[Role] = &[Role::Organizer];

/// Check the request's user against a route's allowed roles.
pub fn ensure_role(user: &UserContext, allowed: &[Role]) -> Result<(), AuthzError> {
    authorize_role(user.role(), allowed).inspect_err(|_| {
        tracing::debug!(user_id = %user.user_id(), role = %user.role(), "role not allowed on route");
    })
}
