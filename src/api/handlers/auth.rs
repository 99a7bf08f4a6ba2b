//! Session termination endpoint.

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::api::routes::ApiState;
use crate::auth::session::SESSION_COOKIE_NAME;

/// Acknowledgement returned by a successful logout
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// Terminate the caller's session.
///
/// Reads the session token from the `auth-token` cookie, invalidates the
/// backing session if a token is present, and instructs the client to delete
/// the cookie. Cookie removal is attached to the failure response as well.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse,
         headers(("Set-Cookie" = String, description = "Removal cookie for auth-token"))),
        (status = 500, description = "Logout failed", body = crate::api::error::ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<ApiState>,
    jar: CookieJar,
) -> (CookieJar, Result<Json<LogoutResponse>, ApiError>) {
    let token = jar.get(SESSION_COOKIE_NAME).map(|cookie| cookie.value().to_owned());

    // Removal cookie is attached unconditionally, on both outcomes.
    let jar = jar.remove(Cookie::build((SESSION_COOKIE_NAME, "")).path("/"));

    if let Some(token) = token {
        if let Err(err) = state.session_service.invalidate_session(&token).await {
            error!(error = %err, "Session invalidation failed during logout");
            return (jar, Err(ApiError::internal("Logout failed")));
        }
    }

    (
        jar,
        Ok(Json(LogoutResponse {
            success: true,
            message: "Logged out successfully".to_string(),
        })),
    )
}
