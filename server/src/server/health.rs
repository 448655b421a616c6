//! Health check endpoints.
//!
//! `/health` is a liveness probe that never touches dependencies. `/ready`
//! pings every registered [`DependencyCheck`] and answers `503` when any of
//! them fails.

use super::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use rifa_auth::stores::RedisSessionStore;
use rifa_postgres::PostgresStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`DependencyCheck::check`].
pub type CheckFuture<'a> = Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'a>>;

/// A backing service the server cannot work without.
pub trait DependencyCheck: Send + Sync {
    /// Name reported in the readiness body.
    fn name(&self) -> &'static str;

    /// Round trip to the dependency.
    fn check(&self) -> CheckFuture<'_>;
}

impl DependencyCheck for PostgresStore {
    fn name(&self) -> &'static str {
        "database"
    }

    fn check(&self) -> CheckFuture<'_> {
        Box::pin(async move { self.ping().await.map_err(|e| e.to_string()) })
    }
}

impl DependencyCheck for RedisSessionStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn check(&self) -> CheckFuture<'_> {
        Box::pin(async move { self.ping().await.map_err(|e| e.to_string()) })
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
}

/// Liveness check.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"ok","version":"0.1.0"}
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,
    /// Result per dependency
    pub checks: BTreeMap<&'static str, bool>,
}

/// Readiness check.
///
/// ```bash
/// curl http://localhost:8080/ready
/// # {"ready":true,"checks":{"database":true,"redis":true}}
/// ```
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let mut checks = BTreeMap::new();
    for dependency in &state.checks {
        let healthy = match dependency.check().await {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(dependency = dependency.name(), %error, "Readiness check failed");
                false
            }
        };
        checks.insert(dependency.name(), healthy);
    }

    let ready = checks.values().all(|healthy| *healthy);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ReadinessResponse { ready, checks }))
}
