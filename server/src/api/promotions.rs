//! Promotion bundles and price quotes.
//!
//! - GET /api/raffles/:id/promotions - public
//! - POST /api/raffles/:id/promotions - [`can::ManagePromotions`]
//! - PUT/DELETE /api/promotions/:id - [`can::ManagePromotions`]
//! - GET /api/raffles/:id/quote?quantity=n - public

use crate::auth::{Authorized, can};
use crate::server::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use rifa_core::pricing::Quote;
use rifa_core::{NewPromotion, Promotion, PromotionChanges, PromotionId, RaffleId};
use rifa_web::{ApiJson, ApiPath, ApiQuery, AppError};
use serde::Deserialize;

/// Query string of the quote endpoint.
#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    /// Tickets to price
    pub quantity: u32,
}

/// Promotions of a raffle, smallest bundle first.
///
/// # Errors
///
/// `404` for unknown raffles.
pub async fn list_promotions(
    State(state): State<AppState>,
    ApiPath(raffle_id): ApiPath<RaffleId>,
) -> Result<Json<Vec<Promotion>>, AppError> {
    Ok(Json(state.promotions.list(raffle_id).await?))
}

/// Add a bundle to a raffle.
///
/// # Errors
///
/// `404` for unknown raffles, `400` for invalid bundles.
pub async fn create_promotion(
    _admin: Authorized<can::ManagePromotions>,
    State(state): State<AppState>,
    ApiPath(raffle_id): ApiPath<RaffleId>,
    ApiJson(input): ApiJson<NewPromotion>,
) -> Result<(StatusCode, Json<Promotion>), AppError> {
    let promotion = state.promotions.create(raffle_id, input).await?;
    Ok((StatusCode::CREATED, Json(promotion)))
}

/// Edit a bundle.
///
/// # Errors
///
/// `404` for unknown promotions, `400` for invalid changes.
pub async fn update_promotion(
    _admin: Authorized<can::ManagePromotions>,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PromotionId>,
    ApiJson(changes): ApiJson<PromotionChanges>,
) -> Result<Json<Promotion>, AppError> {
    Ok(Json(state.promotions.update(id, changes).await?))
}

/// Remove a bundle.
///
/// # Errors
///
/// `404` for unknown promotions.
pub async fn delete_promotion(
    _admin: Authorized<can::ManagePromotions>,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PromotionId>,
) -> Result<StatusCode, AppError> {
    state.promotions.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cheapest price for `quantity` tickets.
///
/// # Errors
///
/// `404` for unknown raffles, `400` for a zero or missing quantity.
pub async fn quote(
    State(state): State<AppState>,
    ApiPath(raffle_id): ApiPath<RaffleId>,
    ApiQuery(params): ApiQuery<QuoteParams>,
) -> Result<Json<Quote>, AppError> {
    Ok(Json(state.promotions.quote(raffle_id, params.quantity).await?))
}
