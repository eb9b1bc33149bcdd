use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{
        skilldtos::SubmitSkillDto,
        userdtos::{UpdateStudentProfileDto, UploadSchoolIdDto},
        ApiResponse,
    },
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn student_handler() -> Router {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/school-id", post(upload_school_id))
        .route("/skills", get(get_submissions).post(submit_skill))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Student])
        }))
}

pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let dashboard = app_state.dashboard_service.student(user.user.id).await?;
    Ok(Json(ApiResponse::success("Dashboard retrieved successfully", dashboard)))
}

pub async fn get_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state.account_service.student_profile(user.user.id).await?;
    Ok(Json(ApiResponse::success("Profile retrieved successfully", profile)))
}

pub async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateStudentProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let profile = app_state
        .account_service
        .update_student_profile(user.user.id, body)
        .await?;
    Ok(Json(ApiResponse::success("Profile updated successfully", profile)))
}

pub async fn upload_school_id(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UploadSchoolIdDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let profile = app_state
        .account_service
        .upload_school_id(user.user.id, body.document)
        .await?;
    Ok(Json(ApiResponse::success(
        "School ID uploaded. An administrator will review it shortly.",
        profile,
    )))
}

pub async fn get_submissions(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let submissions = app_state.skill_service.student_submissions(user.user.id).await?;
    Ok(Json(ApiResponse::success("Submissions retrieved successfully", submissions)))
}

pub async fn submit_skill(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<SubmitSkillDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let submission = app_state.skill_service.submit(user.user.id, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Skill submitted for review",
            submission,
        )),
    ))
}
