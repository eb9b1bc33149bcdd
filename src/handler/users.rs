use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Extension, Json, Router};

use crate::{dtos::ApiResponse, error::HttpError, middleware::JWTAuthMiddeware, AppState};

pub fn users_handler() -> Router {
    Router::new()
        .route("/me", get(get_me))
        .route("/updates", get(get_updates))
}

pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let response = match user.user.role {
        Some(_) => ApiResponse::success("User retrieved successfully", user.user),
        None => ApiResponse::success("Please select a role to continue", user.user)
            .with_redirect("/api/auth/select-role"),
    };
    Ok(Json(response))
}

/// Latest announcements for the caller's audience.
pub async fn get_updates(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let updates = app_state.dashboard_service.updates_for(user.user.role).await?;
    Ok(Json(ApiResponse::success("Updates retrieved successfully", updates)))
}
