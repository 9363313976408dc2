//! Session authentication middleware for the REST API
//!
//! Protected routes require an `Authorization: Bearer <token>` header whose
//! token was issued by `POST /auth/login` and has not expired or been
//! revoked. The resolved user is attached to the request as an [`AuthUser`]
//! extension.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::AppState;
use crate::error::{AuthError, Error};
use crate::types::UserInfo;

/// Authenticated caller, inserted by [`require_session`]
#[derive(Clone, Debug)]
pub struct AuthUser {
    /// The verified user
    pub user: UserInfo,
    /// The bearer token the request carried
    pub token: String,
}

/// Middleware rejecting requests without a live session
///
/// # Returns
///
/// - 401 `unauthorized` if the header is missing or not a bearer token
/// - 401 `invalid_token` if the token is unknown, expired or revoked
/// - The response from the next handler otherwise
///
/// # Examples
///
/// ```no_run
/// use axum::{Router, middleware, routing::get};
/// use download_tracker::api::{AppState, auth::require_session};
///
/// # fn build(state: AppState) -> Router {
/// Router::new()
///     .route("/downloads", get(|| async { "ok" }))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_session))
///     .with_state(state)
/// # }
/// ```
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        return Error::Auth(AuthError::MissingToken).into_response();
    };

    match state.tracker.authenticate(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(AuthUser { user, token });
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extract the token from an `Authorization: Bearer` header
///
/// The scheme is matched case-insensitively; an empty token counts as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}
