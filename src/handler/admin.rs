use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        jobdtos::{ModerateJobDto, ProcessApplicationDto},
        skilldtos::DecideSubmissionDto,
        userdtos::{CreateSiteUpdateDto, RejectIdDto},
        ApiResponse,
    },
    error::HttpError,
    handler::client::decision_response,
    middleware::{role_check, JWTAuthMiddeware},
    models::{
        jobmodel::ModerationAction, skillmodel::SubmissionOutcome, usermodel::UserRole,
    },
    AppState,
};

pub fn admin_handler() -> Router {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/users", get(get_users))
        .route("/users/:user_id/ban", post(toggle_ban))
        .route("/users/:user_id/verify", post(toggle_verification))
        .route("/users/:user_id/reject-id", post(reject_school_id))
        .route("/jobs/pending", get(get_pending_jobs))
        .route("/jobs/expired", get(get_expired_jobs))
        .route("/jobs/:job_id/moderate", post(moderate_job))
        .route("/jobs/:job_id", delete(delete_job))
        .route("/skills/pending", get(get_pending_submissions))
        .route("/skills/:submission_id/decide", post(decide_submission))
        .route("/applications/pending", get(get_pending_applications))
        .route("/applications/:application_id/process", post(process_application))
        .route("/updates", post(create_site_update))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Admin])
        }))
}

pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let dashboard = app_state.dashboard_service.admin().await?;
    Ok(Json(ApiResponse::success("Dashboard retrieved successfully", dashboard)))
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let users = app_state.account_service.list_users().await?;
    Ok(Json(ApiResponse::success("Users retrieved successfully", users)))
}

pub async fn toggle_ban(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.account_service.toggle_ban(&admin.user, user_id).await?;
    let message = if user.is_active {
        "User has been unbanned"
    } else {
        "User has been banned"
    };
    Ok(Json(ApiResponse::success(message, user)))
}

pub async fn toggle_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let toggled = app_state.account_service.toggle_verification(user_id).await?;
    Ok(Json(ApiResponse::success("Verification status updated", toggled)))
}

pub async fn reject_school_id(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<RejectIdDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let profile = app_state
        .account_service
        .reject_school_id(user_id, body.reason)
        .await?;
    Ok(Json(ApiResponse::success("School ID rejected", profile)))
}

pub async fn get_pending_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.job_service.pending_jobs().await?;
    Ok(Json(ApiResponse::success("Pending jobs retrieved successfully", jobs)))
}

pub async fn get_expired_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.job_service.expired_jobs(Utc::now()).await?;
    Ok(Json(ApiResponse::success("Expired jobs retrieved successfully", jobs)))
}

pub async fn moderate_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<ModerateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.moderate(job_id, body.action).await?;
    let message = match body.action {
        ModerationAction::Approve => "Job approved and now live",
        ModerationAction::Reject => "Job rejected",
    };
    Ok(Json(ApiResponse::success(message, job)))
}

pub async fn delete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.delete_job(&admin.user, job_id).await?;
    Ok(Json(ApiResponse::success("Job deleted successfully", job)))
}

pub async fn get_pending_submissions(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let submissions = app_state.skill_service.pending().await?;
    Ok(Json(ApiResponse::success(
        "Pending submissions retrieved successfully",
        submissions,
    )))
}

pub async fn decide_submission(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(submission_id): Path<Uuid>,
    Json(body): Json<DecideSubmissionDto>,
) -> Result<impl IntoResponse, HttpError> {
    let response = match app_state.skill_service.decide(submission_id, body.decision).await? {
        SubmissionOutcome::Approved(submission, profile) => Json(ApiResponse::success(
            "Skill approved and badge awarded",
            json!({ "submission": submission, "profile": profile }),
        )),
        SubmissionOutcome::Rejected(submission) => Json(ApiResponse::success(
            "Skill submission rejected",
            json!({ "submission": submission }),
        )),
        SubmissionOutcome::AlreadyDecided(submission) => Json(ApiResponse::warning(
            "This submission has already been reviewed",
            json!({ "submission": submission }),
        )),
    };
    Ok(response)
}

pub async fn get_pending_applications(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let applications = app_state.hiring_service.pending_applications().await?;
    Ok(Json(ApiResponse::success(
        "Pending applications retrieved successfully",
        applications,
    )))
}

pub async fn process_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(application_id): Path<Uuid>,
    Json(body): Json<ProcessApplicationDto>,
) -> Result<impl IntoResponse, HttpError> {
    let decision = app_state
        .hiring_service
        .admin_process(application_id, body.action)
        .await?;
    Ok(decision_response(decision))
}

pub async fn create_site_update(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateSiteUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let update = app_state.dashboard_service.create_site_update(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Update published", update)),
    ))
}
