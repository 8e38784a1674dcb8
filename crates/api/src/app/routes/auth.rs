use std::sync::Arc;

use axum::{Extension, Json, Router, routing::post};

use eventdesk_infra::services::{LoginToken, RegisteredUser};

use crate::app::dto::{self, ApiResponse, LoginRequest, RegisterRequest, ValidJson};
use crate::app::errors::ApiError;
use crate::app::routes::system::with_method_fallback;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/register", with_method_fallback(post(register)))
        .route("/login", with_method_fallback(post(login)))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    ValidJson(new_user): ValidJson<RegisterRequest>,
) -> Result<Json<ApiResponse<RegisteredUser>>, ApiError> {
    let user = services.auth.register(new_user).await?;
    Ok(dto::success("User registered successfully", user))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ValidJson(credentials): ValidJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginToken>>, ApiError> {
    let token = services
        .auth
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(dto::success("Login successful", token))
}
