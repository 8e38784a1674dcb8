use axum::{Json, http::StatusCode, response::Response, routing::MethodRouter};

use crate::app::dto::{self, ApiResponse};
use crate::app::errors::json_error;

pub async fn health() -> Json<ApiResponse<()>> {
    dto::message_only("OK")
}

/// Router fallback for paths no route matches.
pub async fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "Not found")
}

pub async fn method_not_allowed() -> Response {
    json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Answer unsupported methods on a known path with the JSON error envelope.
///
/// Call after any `merge`, since two method routers with fallbacks cannot be merged.
pub fn with_method_fallback(route: MethodRouter) -> MethodRouter {
    route.fallback(method_not_allowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn fallbacks_use_the_error_envelope() {
        let response = not_found().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_of(response).await,
            serde_json::json!({ "success": false, "message": "Not found" })
        );

        let response = method_not_allowed().await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_of(response).await["message"], "Method not allowed");
    }
}
