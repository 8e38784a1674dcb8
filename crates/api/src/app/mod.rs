//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store backend + service construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs, validation, response envelope
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;
use routes::system::with_method_fallback;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = services.auth_state();

    // Protected routes: every request needs a valid bearer token.
    let events = routes::events::router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", with_method_fallback(get(routes::system::health)))
        .nest("/api/auth", routes::auth::router())
        .nest("/api/event", events)
        .fallback(routes::system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_logger))
                .layer(Extension(services)),
        )
}
