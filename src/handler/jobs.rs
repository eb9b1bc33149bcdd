use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        jobdtos::{ApplyJobDto, JobBoardQuery},
        ApiResponse,
    },
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::{jobmodel::ApplyOutcome, usermodel::UserRole},
    service::job_service::BoardView,
    AppState,
};

pub fn jobs_handler() -> Router {
    Router::new()
        .route("/", get(job_board))
        .route("/:job_id", get(job_detail))
        .route(
            "/:job_id/apply",
            post(apply_to_job).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Student])
            })),
        )
        .layer(middleware::from_fn(|state, req, next| {
            role_check(
                state,
                req,
                next,
                vec![UserRole::Student, UserRole::Client, UserRole::Donor, UserRole::Admin],
            )
        }))
}

pub async fn job_board(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(query): Query<JobBoardQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let view = app_state
        .job_service
        .job_board(&user.user, query.q.as_deref())
        .await?;

    let response = match view {
        BoardView::Jobs(jobs) => {
            Json(ApiResponse::success("Jobs retrieved successfully", jobs)).into_response()
        }
        BoardView::Redirect { message, to } => {
            Json(ApiResponse::redirect(&message, to)).into_response()
        }
    };
    Ok(response)
}

pub async fn job_detail(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let detail = app_state.job_service.job_detail(job_id).await?;
    Ok(Json(ApiResponse::success("Job retrieved successfully", detail)))
}

pub async fn apply_to_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<ApplyJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let response = match app_state.hiring_service.apply(&user.user, job_id, body).await? {
        ApplyOutcome::Created(application) => (
            StatusCode::CREATED,
            Json(ApiResponse::success("Application submitted successfully", application)),
        ),
        ApplyOutcome::AlreadyApplied(application) => (
            StatusCode::OK,
            Json(ApiResponse::warning("You have already applied for this job", application)),
        ),
    };
    Ok(response)
}
