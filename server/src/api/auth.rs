//! Account session endpoints.
//!
//! - POST /api/auth/login - Exchange credentials for a session token
//! - POST /api/auth/register - Public sign-up (user role)
//! - POST /api/auth/logout - Revoke the presented session
//! - GET /api/auth/profile - Current user and capabilities

use crate::auth::SessionUser;
use crate::server::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use rifa_auth::{Credentials, LoginSession, Profile};
use rifa_core::User;
use rifa_web::{ApiJson, AppError, ClientIp, CorrelationId};

/// Log in.
///
/// # Errors
///
/// `401` for unknown users, wrong passwords and inactive accounts alike.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    CorrelationId(correlation_id): CorrelationId,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<LoginSession>, AppError> {
    let username = credentials.username.clone();
    match state.accounts.login(credentials).await {
        Ok(session) => {
            tracing::info!(%correlation_id, %client_ip, user_id = %session.user.id, "Login succeeded");
            Ok(Json(session))
        }
        Err(error) => {
            tracing::warn!(%correlation_id, %client_ip, %username, %error, "Login failed");
            Err(error.into())
        }
    }
}

/// Create a `user`-role account.
///
/// # Errors
///
/// `400` for invalid or taken usernames and short passwords.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.accounts.register(credentials).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Revoke the current session.
///
/// # Errors
///
/// `401` when the session is already gone.
pub async fn logout(State(state): State<AppState>, session: SessionUser) -> Result<StatusCode, AppError> {
    state.accounts.logout(&session.token).await?;
    tracing::info!(user_id = %session.user.id, "Logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// Current user with the capabilities of their role.
pub async fn profile(session: SessionUser) -> Json<Profile> {
    Json(Profile::from(session.user))
}
