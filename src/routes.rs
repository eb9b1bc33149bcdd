use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        admin::admin_handler, auth::auth_handler, client::client_handler, donor::donor_handler,
        jobs::jobs_handler, mpesa::mpesa_handler, payments::payments_handler,
        student::student_handler, users::users_handler,
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/users", users_handler().layer(middleware::from_fn(auth)))
        .nest("/student", student_handler().layer(middleware::from_fn(auth)))
        .nest("/jobs", jobs_handler().layer(middleware::from_fn(auth)))
        .nest("/client", client_handler().layer(middleware::from_fn(auth)))
        .nest("/donor", donor_handler().layer(middleware::from_fn(auth)))
        .nest("/payments", payments_handler().layer(middleware::from_fn(auth)))
        .nest("/admin", admin_handler().layer(middleware::from_fn(auth)))
        // gateway callback, unauthenticated
        .nest("/mpesa", mpesa_handler())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
