//! Ticket pool API endpoints.
//!
//! Browsing and reserving are public so visitors can pick numbers without
//! an account. Sales need [`can::SellTickets`], the summary
//! [`can::ViewDashboard`], and pool initialization and status overrides
//! [`can::ManageTickets`].
//!
//! # Ticket Flow
//!
//! ```text
//! available ──reserve──▶ reserved ──sell──▶ sold
//!     │                                      ▲
//!     └─────────────────sell─────────────────┘
//!
//! any ──set_status(available)──▶ available (buyer cleared)
//! ```

use crate::auth::{Authorized, can};
use crate::server::state::AppState;
use axum::{Json, extract::State};
use rifa_core::service::{BulkStatusUpdate, InitializedPool, Reservation, SaleReceipt};
use rifa_core::{
    BuyerInfo, Page, RaffleId, StatusSummary, Ticket, TicketNumber, TicketQuery, TicketStatus,
};
use rifa_web::{ApiJson, ApiPath, ApiQuery, AppError};
use serde::Deserialize;

// ============================================================================
// Request Types
// ============================================================================

/// Query string of the ticket listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListTicketsParams {
    /// Zero-based page (default 0)
    pub page: Option<u32>,
    /// Tickets per page (default 100, max 1000)
    pub page_size: Option<u32>,
    /// Only tickets in this status
    pub status: Option<TicketStatus>,
}

impl From<ListTicketsParams> for TicketQuery {
    fn from(params: ListTicketsParams) -> Self {
        let defaults = Self::default();
        Self {
            status: params.status,
            page: params.page.unwrap_or(defaults.page),
            page_size: params.page_size.unwrap_or(defaults.page_size),
        }
    }
}

/// Numbers to reserve.
#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    /// Ticket numbers; unpadded input such as `"7"` is accepted
    pub numbers: Vec<String>,
}

/// Numbers to sell and who bought them.
#[derive(Debug, Deserialize)]
pub struct SellRequest {
    /// Ticket numbers
    pub numbers: Vec<String>,
    /// Buyer contact and payment reference
    pub buyer: BuyerInfo,
}

/// Administrative status override.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// Ticket numbers
    pub numbers: Vec<String>,
    /// Target status
    pub status: TicketStatus,
    /// Replacement notes
    #[serde(default)]
    pub notes: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Replace the raffle's pool with a fresh one.
///
/// # Errors
///
/// `404` for unknown raffles, `500` if the pool cannot be written.
pub async fn initialize_pool(
    admin: Authorized<can::ManageTickets>,
    State(state): State<AppState>,
    ApiPath(raffle_id): ApiPath<RaffleId>,
) -> Result<Json<InitializedPool>, AppError> {
    tracing::info!(%raffle_id, by = %admin.user.username, "Pool initialization requested");
    Ok(Json(state.tickets.initialize_pool(raffle_id).await?))
}

/// A page of tickets ordered by number.
///
/// # Errors
///
/// `404` for unknown raffles, `400` for an out-of-range page size.
pub async fn list_tickets(
    State(state): State<AppState>,
    ApiPath(raffle_id): ApiPath<RaffleId>,
    ApiQuery(params): ApiQuery<ListTicketsParams>,
) -> Result<Json<Page<Ticket>>, AppError> {
    Ok(Json(state.tickets.list(raffle_id, params.into()).await?))
}

/// Numbers still available.
///
/// # Errors
///
/// `404` for unknown raffles.
pub async fn available_numbers(
    State(state): State<AppState>,
    ApiPath(raffle_id): ApiPath<RaffleId>,
) -> Result<Json<Vec<TicketNumber>>, AppError> {
    Ok(Json(state.tickets.available_numbers(raffle_id).await?))
}

/// One ticket.
///
/// # Errors
///
/// `404` for unknown raffles or numbers.
pub async fn get_ticket(
    State(state): State<AppState>,
    ApiPath((raffle_id, number)): ApiPath<(RaffleId, String)>,
) -> Result<Json<Ticket>, AppError> {
    Ok(Json(state.tickets.get(raffle_id, &number).await?))
}

/// Reserve every requested number, or none.
///
/// # Errors
///
/// `400 TICKETS_UNAVAILABLE` listing the blocking tickets when any is not
/// available.
pub async fn reserve(
    State(state): State<AppState>,
    ApiPath(raffle_id): ApiPath<RaffleId>,
    ApiJson(request): ApiJson<ReserveRequest>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(state.tickets.reserve(raffle_id, &request.numbers).await?))
}

/// Record a sale.
///
/// # Errors
///
/// `400 TICKETS_UNAVAILABLE` when any ticket is already sold, `400` for a
/// missing buyer name.
pub async fn sell(
    seller: Authorized<can::SellTickets>,
    State(state): State<AppState>,
    ApiPath(raffle_id): ApiPath<RaffleId>,
    ApiJson(request): ApiJson<SellRequest>,
) -> Result<Json<SaleReceipt>, AppError> {
    let receipt = state.tickets.sell(raffle_id, &request.numbers, request.buyer).await?;
    tracing::info!(%raffle_id, seller = %seller.user.username, count = receipt.numbers.len(), "Sale recorded");
    Ok(Json(receipt))
}

/// Override ticket status.
///
/// # Errors
///
/// `400` for invalid numbers, `404` for unknown ones.
pub async fn set_status(
    _admin: Authorized<can::ManageTickets>,
    State(state): State<AppState>,
    ApiPath(raffle_id): ApiPath<RaffleId>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> Result<Json<BulkStatusUpdate>, AppError> {
    let update = state
        .tickets
        .set_status(raffle_id, &request.numbers, request.status, request.notes)
        .await?;
    Ok(Json(update))
}

/// Ticket counts per status.
///
/// # Errors
///
/// `404` for unknown raffles.
pub async fn summary(
    _viewer: Authorized<can::ViewDashboard>,
    State(state): State<AppState>,
    ApiPath(raffle_id): ApiPath<RaffleId>,
) -> Result<Json<StatusSummary>, AppError> {
    Ok(Json(state.tickets.summary(raffle_id).await?))
}
