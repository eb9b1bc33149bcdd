use std::sync::Arc;

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{
        paymentdtos::{DonateDto, PaymentInitiatedDto},
        ApiResponse,
    },
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn donor_handler() -> Router {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/donate", post(donate))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Donor])
        }))
}

pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let dashboard = app_state.dashboard_service.donor(user.user.id).await?;
    Ok(Json(ApiResponse::success("Dashboard retrieved successfully", dashboard)))
}

pub async fn donate(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<DonateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let payment = app_state.payment_service.donate(&user.user, body).await?;
    Ok(Json(ApiResponse::success(
        "STK push sent. Enter your M-Pesa PIN to complete the donation.",
        PaymentInitiatedDto::from_payment(&payment),
    )))
}
