use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        jobdtos::{CreateJobDto, UpdateJobDto},
        paymentdtos::{PayForJobDto, PaymentInitiatedDto},
        ApiResponse,
    },
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    service::hiring_service::Decision,
    AppState,
};

pub fn client_handler() -> Router {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/jobs", get(get_my_jobs).post(create_job))
        .route("/jobs/:job_id", put(edit_job).delete(delete_job))
        .route("/jobs/:job_id/applicants", get(get_applicants))
        .route(
            "/jobs/:job_id/applications/:application_id/hire",
            post(hire_applicant),
        )
        .route(
            "/jobs/:job_id/applications/:application_id/reject",
            post(reject_applicant),
        )
        .route("/jobs/:job_id/pay", post(pay_for_job))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Client, UserRole::Admin])
        }))
}

/// Shared rendering for hire/reject outcomes.
pub fn decision_response(decision: Decision) -> Response {
    match decision {
        Decision::Hired(result) => {
            Json(ApiResponse::success("Student hired successfully", result)).into_response()
        }
        Decision::Rejected(application) => {
            Json(ApiResponse::success("Applicant rejected", application)).into_response()
        }
        Decision::AlreadyDecided(application) => Json(ApiResponse::warning(
            "This application has already been processed",
            application,
        ))
        .into_response(),
    }
}

pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let dashboard = app_state.dashboard_service.client(&user.user).await?;
    Ok(Json(ApiResponse::success("Dashboard retrieved successfully", dashboard)))
}

pub async fn get_my_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.job_service.client_jobs(user.user.id).await?;
    Ok(Json(ApiResponse::success("Jobs retrieved successfully", jobs)))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state.job_service.create_job(&user.user, body).await?;
    let message = if user.user.is_admin() {
        "Job posted and live on the board"
    } else {
        "Job submitted for review. It will go live once approved."
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::success(message, job))))
}

pub async fn edit_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<UpdateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state.job_service.edit_job(&user.user, job_id, body).await?;
    Ok(Json(ApiResponse::success("Job updated successfully", job)))
}

pub async fn delete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.delete_job(&user.user, job_id).await?;
    Ok(Json(ApiResponse::success("Job deleted successfully", job)))
}

pub async fn get_applicants(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let applicants = app_state.hiring_service.applicants(&user.user, job_id).await?;
    Ok(Json(ApiResponse::success("Applicants retrieved successfully", applicants)))
}

pub async fn hire_applicant(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path((job_id, application_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpError> {
    let decision = app_state
        .hiring_service
        .hire(&user.user, job_id, application_id)
        .await?;
    Ok(decision_response(decision))
}

pub async fn reject_applicant(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path((job_id, application_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpError> {
    let decision = app_state
        .hiring_service
        .reject(&user.user, job_id, application_id)
        .await?;
    Ok(decision_response(decision))
}

pub async fn pay_for_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<PayForJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let payment = app_state
        .payment_service
        .pay_for_job(&user.user, job_id, &body.phone_number)
        .await?;
    Ok(Json(ApiResponse::success(
        "STK push sent. Check your phone to complete the payment.",
        PaymentInitiatedDto::from_payment(&payment),
    )))
}
