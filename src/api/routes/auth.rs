//! Account handlers: register, login, verify, logout.

use crate::api::{AppState, auth::AuthUser};
use crate::error::Error;
use crate::types::{Session, UserInfo};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use super::{LoginRequest, RegisterRequest, RegisterResponse};

/// POST /auth/register - Create an account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invalid name, email or password", body = crate::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::error::ApiError)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, Error> {
    let user = state
        .tracker
        .register(&request.name, &request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user_id: user.id,
        }),
    ))
}

/// POST /auth/login - Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = Session),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Session>, Error> {
    let session = state.tracker.login(&request.email, &request.password).await?;
    Ok(Json(session))
}

/// GET /auth/verify - Current user for the presented token
#[utoipa::path(
    get,
    path = "/api/v1/auth/verify",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token is valid", body = UserInfo),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError)
    )
)]
pub async fn verify(Extension(auth): Extension<AuthUser>) -> Json<UserInfo> {
    Json(auth.user)
}

/// POST /auth/logout - Revoke the presented token
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<StatusCode, Error> {
    state.tracker.logout(&auth.token).await?;
    tracing::debug!(user_id = auth.user.id.0, "Session revoked");
    Ok(StatusCode::NO_CONTENT)
}
