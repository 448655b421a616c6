//! Raffle management API endpoints.
//!
//! Reads are public; writes require [`can::ManageRaffles`]. Activating a
//! raffle deactivates every other one.

use crate::auth::{Authorized, can};
use crate::server::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use rifa_core::{NewRaffle, Raffle, RaffleChanges, RaffleId};
use rifa_web::{ApiJson, ApiPath, AppError};

/// All raffles, newest first.
///
/// # Errors
///
/// `500` on storage failures.
pub async fn list_raffles(State(state): State<AppState>) -> Result<Json<Vec<Raffle>>, AppError> {
    Ok(Json(state.raffles.list().await?))
}

/// The raffle currently on sale.
///
/// # Errors
///
/// `404` when no raffle is active.
pub async fn active_raffle(State(state): State<AppState>) -> Result<Json<Raffle>, AppError> {
    state
        .raffles
        .active()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("No active raffle"))
}

/// One raffle.
///
/// # Errors
///
/// `404` for unknown IDs.
pub async fn get_raffle(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RaffleId>,
) -> Result<Json<Raffle>, AppError> {
    Ok(Json(state.raffles.get(id).await?))
}

/// Create a raffle.
///
/// # Errors
///
/// `400` for invalid input or a taken name.
pub async fn create_raffle(
    admin: Authorized<can::ManageRaffles>,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewRaffle>,
) -> Result<(StatusCode, Json<Raffle>), AppError> {
    let raffle = state.raffles.create(input).await?;
    tracing::info!(raffle_id = %raffle.id, by = %admin.user.username, "Raffle created via API");
    Ok((StatusCode::CREATED, Json(raffle)))
}

/// Update a raffle.
///
/// # Errors
///
/// `404` for unknown IDs, `400` for invalid changes.
pub async fn update_raffle(
    _admin: Authorized<can::ManageRaffles>,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RaffleId>,
    ApiJson(changes): ApiJson<RaffleChanges>,
) -> Result<Json<Raffle>, AppError> {
    Ok(Json(state.raffles.update(id, changes).await?))
}

/// Delete a raffle with its tickets and promotions.
///
/// # Errors
///
/// `404` for unknown IDs.
pub async fn delete_raffle(
    admin: Authorized<can::ManageRaffles>,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RaffleId>,
) -> Result<StatusCode, AppError> {
    state.raffles.delete(id).await?;
    tracing::info!(raffle_id = %id, by = %admin.user.username, "Raffle deleted via API");
    Ok(StatusCode::NO_CONTENT)
}
