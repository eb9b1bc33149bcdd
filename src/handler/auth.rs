use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    dtos::{
        userdtos::{
            LoginUserDto, RegisterAccountDto, RegisterStudentDto, RegisterUserDto, SelectRoleDto,
            UserLoginResponseDto,
        },
        ApiResponse, Response,
    },
    error::HttpError,
    middleware::{auth, JWTAuthMiddeware},
    models::usermodel::{User, UserRole},
    utils::token,
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/register/student", post(register_student))
        .route("/register/client", post(register_client))
        .route("/register/donor", post(register_donor))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route(
            "/select-role",
            post(select_role).layer(middleware::from_fn(auth)),
        )
}

fn session_cookie(value: String, max_age: time::Duration) -> Result<HeaderMap, HttpError> {
    let cookie = Cookie::build(("token", value))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse::<HeaderValue>()
            .map_err(|_| HttpError::server_error("Could not build session cookie"))?,
    );
    Ok(headers)
}

fn issue_session(app_state: &AppState, user: &User) -> Result<(String, HeaderMap), HttpError> {
    let token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let headers = session_cookie(token.clone(), time::Duration::minutes(app_state.env.jwt_maxage))?;
    Ok((token, headers))
}

fn signed_in(
    app_state: &AppState,
    user: User,
    status: StatusCode,
) -> Result<axum::response::Response, HttpError> {
    let (token, headers) = issue_session(app_state, &user)?;

    let mut response = (
        status,
        Json(UserLoginResponseDto {
            status: "success".to_string(),
            token,
            user,
        }),
    )
        .into_response();
    response.headers_mut().extend(headers);
    Ok(response)
}

/// Role-less sign-up. The account is signed in and sent to role selection.
pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state.account_service.register(body).await?;

    let (_token, headers) = issue_session(&app_state, &user)?;

    let mut response = (
        StatusCode::CREATED,
        Json(
            ApiResponse::success("Account created. Please choose how you will use ComradeGigs.", user)
                .with_redirect("/api/auth/select-role"),
        ),
    )
        .into_response();
    response.headers_mut().extend(headers);
    Ok(response)
}

pub async fn register_student(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterStudentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (user, _profile) = app_state.account_service.register_student(body).await?;
    signed_in(&app_state, user, StatusCode::CREATED)
}

pub async fn register_client(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterAccountDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .account_service
        .register_account(body, UserRole::Client)
        .await?;
    signed_in(&app_state, user, StatusCode::CREATED)
}

pub async fn register_donor(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterAccountDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .account_service
        .register_account(body, UserRole::Donor)
        .await?;
    signed_in(&app_state, user, StatusCode::CREATED)
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .account_service
        .authenticate(&body.email, &body.password)
        .await?;
    signed_in(&app_state, user, StatusCode::OK)
}

pub async fn logout() -> Result<impl IntoResponse, HttpError> {
    let headers = session_cookie(String::new(), time::Duration::ZERO)?;

    let mut response = Json(Response {
        status: "success",
        message: "Logged out successfully".to_string(),
    })
    .into_response();
    response.headers_mut().extend(headers);
    Ok(response)
}

pub async fn select_role(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<SelectRoleDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let updated = app_state.account_service.select_role(&user.user, body).await?;
    let home = match updated.role {
        Some(UserRole::Student) => "/api/student/dashboard",
        Some(UserRole::Donor) => "/api/donor/dashboard",
        _ => "/api/client/dashboard",
    };

    Ok(Json(
        ApiResponse::success("Role selected successfully", updated).with_redirect(home),
    ))
}
