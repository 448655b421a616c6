//! HTTP server module for the Rifa backend.
//!
//! This module provides the Axum-based HTTP server with:
//! - Application state management
//! - Health and readiness endpoints
//! - Router configuration

pub mod health;
pub mod routes;
pub mod state;

pub use health::{DependencyCheck, health_check, readiness_check};
pub use routes::build_router;
pub use state::AppState;
