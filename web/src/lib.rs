//! Axum integration for the Rifa backend.
//!
//! This crate is the thin shell between HTTP and the services in
//! `rifa-core` and `rifa-auth`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         HTTP Shell (Axum)               │  ← JSON, bearer tokens, CORS
//! │  - Request parsing (extractors)         │  ← Correlation IDs, tracing
//! │  - Error → status mapping (AppError)    │  ← Static uploads
//! ├─────────────────────────────────────────┤
//! │         Services (rifa-core/rifa-auth)  │
//! │  - Ticket lifecycle, pricing, content   │  ← Typed ServiceError/AuthError
//! │  - Accounts, sessions, capabilities     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **Correlation layer** tags the request and opens a tracing span
//! 2. **Extractors** parse path, query, body and bearer token
//! 3. **Service call** returns a domain result
//! 4. **`AppError`** maps failures to `{"code", "message"}` bodies
//!
//! # Example
//!
//! ```ignore
//! use rifa_web::{ApiJson, ApiPath, AppError};
//! use axum::{extract::State, Json};
//!
//! async fn reserve(
//!     State(state): State<AppState>,
//!     ApiPath(raffle_id): ApiPath<RaffleId>,
//!     ApiJson(request): ApiJson<ReserveRequest>,
//! ) -> Result<Json<Reservation>, AppError> {
//!     Ok(Json(state.tickets.reserve(raffle_id, &request.numbers).await?))
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assets;
pub mod error;
pub mod extractors;
pub mod middleware;

// Re-export key types for convenience
pub use assets::uploads_router;
pub use error::AppError;
pub use extractors::{ApiJson, ApiPath, ApiQuery, BearerToken, ClientIp, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
