use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    routing::{MethodRouter, get, post, put},
};

use eventdesk_events::{Event, EventView};

use crate::app::dto::{self, ApiResponse, CreateEventRequest, UpdateEventRequest, ValidJson};
use crate::app::errors::ApiError;
use crate::app::routes::system::with_method_fallback;
use crate::app::services::AppServices;
use crate::authz::ORGANIZER_ONLY;
use crate::context::UserContext;
use crate::middleware::{RoleGuard, require_roles};

/// Event routes. Expects the auth middleware to be layered on top.
pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            with_method_fallback(organizer_only(post(create_event)).merge(get(list_events))),
        )
        .route(
            "/:id",
            with_method_fallback(
                get(get_event).merge(organizer_only(put(update_event).delete(delete_event))),
            ),
        )
        .route("/:id/register", with_method_fallback(post(register_for_event)))
}

fn organizer_only(route: MethodRouter) -> MethodRouter {
    route.route_layer(axum::middleware::from_fn_with_state(
        RoleGuard::new(ORGANIZER_ONLY),
        require_roles,
    ))
}

pub async fn create_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    ValidJson(details): ValidJson<CreateEventRequest>,
) -> Result<Json<ApiResponse<Event>>, ApiError> {
    let event = services.events.create_event(details, user.user_id()).await?;
    Ok(dto::success("Event created successfully", event))
}

pub async fn register_for_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EventView>>, ApiError> {
    let event_id = dto::parse_event_id(&id)?;
    let view = services
        .events
        .register_for_event(user.user_id(), event_id)
        .await?;
    Ok(dto::success("Successfully registered for the event", view))
}

pub async fn list_events(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<ApiResponse<Vec<EventView>>>, ApiError> {
    let events = services.events.get_all_events().await?;
    Ok(dto::success("Events retrieved successfully", events))
}

pub async fn get_event(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EventView>>, ApiError> {
    let event_id = dto::parse_event_id(&id)?;
    let view = services.events.get_event_by_id(event_id).await?;
    Ok(dto::success("Event details retrieved successfully", view))
}

pub async fn update_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<UpdateEventRequest>,
) -> Result<Json<ApiResponse<EventView>>, ApiError> {
    let event_id = dto::parse_event_id(&id)?;
    let view = services
        .events
        .update_event(event_id, patch, user.user_id())
        .await?;
    Ok(dto::success("Event updated successfully", view))
}

pub async fn delete_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Event>>, ApiError> {
    let event_id = dto::parse_event_id(&id)?;
    let event = services.events.delete_event(event_id, user.user_id()).await?;
    Ok(dto::success("Event deleted successfully", event))
}
