use std::sync::Arc;

use axum::{extract::Path, response::IntoResponse, routing::get, Extension, Json, Router};
use uuid::Uuid;

use crate::{
    dtos::paymentdtos::PaymentStatusDto, error::HttpError, middleware::JWTAuthMiddeware,
    AppState,
};

pub fn payments_handler() -> Router {
    Router::new().route("/:payment_id/status", get(payment_status))
}

/// Polled by the payer's browser until the callback settles the payment.
pub async fn payment_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payment = app_state
        .payment_service
        .payment_status(&user.user, payment_id)
        .await?;
    Ok(Json(PaymentStatusDto {
        status: payment.status,
    }))
}
