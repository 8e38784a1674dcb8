use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use eventdesk_auth::{JwtValidator, Role};
use eventdesk_infra::UserStore;

use crate::app::errors::ApiError;
use crate::authz;
use crate::context::UserContext;

pub const MISSING_TOKEN: &str = "Access token is required";
pub const INVALID_TOKEN: &str = "Invalid or expired token";

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn JwtValidator>,
    pub users: Arc<dyn UserStore>,
}

/// Resolve the bearer token to a stored user and attach a [`UserContext`].
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;

    let claims = state.tokens.validate(token, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        ApiError::unauthorized(INVALID_TOKEN)
    })?;

    let user = state
        .users
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized(INVALID_TOKEN))?;

    req.extensions_mut().insert(UserContext::new(user));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let missing = || ApiError::unauthorized(MISSING_TOKEN);

    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(missing)?;

    let header = header.to_str().map_err(|_| missing())?;

    // Auth schemes are case-insensitive.
    let (scheme, token) = header.trim_start().split_once(' ').ok_or_else(missing)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(missing());
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(missing());
    }

    Ok(token)
}

/// Allowed roles for one route, carried as middleware state.
#[derive(Debug, Clone, Copy)]
pub struct RoleGuard {
    allowed: &'static [Role],
}

impl RoleGuard {
    pub fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }
}

/// Reject the request unless the authenticated user holds an allowed role.
///
/// Must run inside [`auth_middleware`].
pub async fn require_roles(
    State(guard): State<RoleGuard>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<UserContext>()
        .ok_or_else(|| ApiError::unauthorized(MISSING_TOKEN))?;

    authz::ensure_role(user, guard.allowed)?;

    Ok(next.run(req).await)
}

/// One `info` line per request. Headers are never logged.
pub async fn request_logger(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        client = client.as_deref().unwrap_or("-"),
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}
