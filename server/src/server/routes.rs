//! Router configuration for the Rifa server.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{auth, promotions, raffles, site, tickets, users};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use rifa_web::{AppError, correlation_id_layer, uploads_router};
use std::path::Path;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Layers, outermost first: correlation ID, request tracing, CORS.
pub fn build_router(state: AppState, uploads_dir: &Path, cors_allowed_origins: &[String]) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/profile", get(auth::profile));

    let raffle_routes = Router::new()
        .route("/", get(raffles::list_raffles).post(raffles::create_raffle))
        .route("/active", get(raffles::active_raffle))
        .route(
            "/:id",
            get(raffles::get_raffle)
                .put(raffles::update_raffle)
                .delete(raffles::delete_raffle),
        )
        .route(
            "/:id/promotions",
            get(promotions::list_promotions).post(promotions::create_promotion),
        )
        .route("/:id/quote", get(promotions::quote))
        .route("/:id/tickets", get(tickets::list_tickets))
        .route("/:id/tickets/initialize", post(tickets::initialize_pool))
        .route("/:id/tickets/available", get(tickets::available_numbers))
        .route("/:id/tickets/summary", get(tickets::summary))
        .route("/:id/tickets/reserve", post(tickets::reserve))
        .route("/:id/tickets/sell", post(tickets::sell))
        .route("/:id/tickets/status", put(tickets::set_status))
        .route("/:id/tickets/:number", get(tickets::get_ticket));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/raffles", raffle_routes)
        .route(
            "/promotions/:id",
            put(promotions::update_promotion).delete(promotions::delete_promotion),
        )
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/site", get(site::site))
        .route("/content/:key", get(site::get_content).put(site::put_content));

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .merge(uploads_router(uploads_dir))
        .fallback(route_not_found)
        .with_state(state)
        .layer(cors_layer(cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
}

async fn route_not_found() -> AppError {
    AppError::not_found("Route not found")
}

/// CORS policy. An empty list allows any origin.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
