// Public M-Pesa confirmation endpoint. Daraja cannot authenticate, so the
// checkout id inside the payload is the only link back to a payment.
use std::sync::Arc;

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, warn};

use crate::{
    models::paymentmodel::CallbackOutcome, service::error::ServiceError, AppState,
};

pub fn mpesa_handler() -> Router {
    Router::new()
        .route("/confirmation", post(mpesa_confirmation))
        .layer(CatchPanicLayer::new())
}

fn gateway_reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

pub async fn mpesa_confirmation(
    Extension(app_state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("M-Pesa callback body is not JSON: {}", e);
            return gateway_reply(StatusCode::BAD_REQUEST, json!({"error": "Invalid JSON"}));
        }
    };

    match app_state.payment_service.handle_callback(payload).await {
        Ok(CallbackOutcome::Settled(_)) | Ok(CallbackOutcome::AlreadySettled(_)) => {
            gateway_reply(StatusCode::OK, json!({"status": "ok"}))
        }
        Ok(CallbackOutcome::NotFound) => {
            gateway_reply(StatusCode::NOT_FOUND, json!({"error": "Payment not found"}))
        }
        Err(ServiceError::CallbackIntegrity(message)) => {
            gateway_reply(StatusCode::BAD_REQUEST, json!({"error": message}))
        }
        Err(e) => {
            error!("Failed to reconcile M-Pesa callback: {}", e);
            gateway_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "Could not process callback"}),
            )
        }
    }
}
