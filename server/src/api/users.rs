//! User administration endpoints, all behind [`can::ManageUsers`].

use crate::auth::{Authorized, can};
use crate::server::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use rifa_auth::{NewAccount, UserChanges};
use rifa_core::{User, UserId};
use rifa_web::{ApiJson, ApiPath, AppError};

type Admin = Authorized<can::ManageUsers>;

/// Every account.
///
/// # Errors
///
/// `500` on storage failures.
pub async fn list_users(_admin: Admin, State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.accounts.list_users().await?))
}

/// One account.
///
/// # Errors
///
/// `404` for unknown IDs.
pub async fn get_user(
    _admin: Admin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.accounts.get_user(id).await?))
}

/// Create an account with any role.
///
/// # Errors
///
/// `400` for invalid input or a taken username.
pub async fn create_user(
    admin: Admin,
    State(state): State<AppState>,
    ApiJson(account): ApiJson<NewAccount>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.accounts.create_user(account).await?;
    tracing::info!(user_id = %user.id, role = %user.role, by = %admin.user.username, "User created via API");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Change role, active flag or password.
///
/// # Errors
///
/// `404` for unknown IDs, `400` when an admin deactivates themselves.
pub async fn update_user(
    admin: Admin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(changes): ApiJson<UserChanges>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.accounts.update_user(&admin.user, id, changes).await?))
}

/// Delete an account and revoke its sessions.
///
/// # Errors
///
/// `404` for unknown IDs, `400` when an admin deletes themselves.
pub async fn delete_user(
    admin: Admin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<StatusCode, AppError> {
    state.accounts.delete_user(&admin.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
