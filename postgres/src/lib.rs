//! `PostgreSQL` store implementation for Rifa.
//!
//! [`PostgresStore`] implements every store trait from `rifa-core` on one
//! connection pool:
//!
//! - Raffles with a partial unique index enforcing a single active raffle
//! - Ticket pools keyed by `(raffle_id, number)`, replaced in one transaction
//! - Conditional multi-ticket updates that commit only when every requested
//!   ticket matched the guard
//! - Promotions, users and content blocks
//!
//! # Example
//!
//! ```ignore
//! use rifa_postgres::PostgresStore;
//! use rifa_core::Stores;
//! use std::sync::Arc;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresStore::connect("postgres://localhost/rifa", 10).await?;
//!     store.migrate().await?;
//!     let stores = Stores::from_backend(Arc::new(store));
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod content;
mod promotions;
mod raffles;
mod rows;
mod tickets;
mod users;

use rifa_core::StoreError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Partial unique index allowing one active raffle.
const SINGLE_ACTIVE_INDEX: &str = "raffles_single_active";

/// `PostgreSQL`-backed store for raffles, tickets, promotions, users and content.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect with a pool of at most `max_connections`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Round-trip a trivial query, for readiness checks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database is unreachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a sqlx error, surfacing unique and foreign key violations.
pub(crate) fn db_error(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &error {
        let constraint = db.constraint().unwrap_or("unknown constraint").to_string();
        if db.is_unique_violation() {
            if constraint == SINGLE_ACTIVE_INDEX {
                return StoreError::Database(
                    "another raffle was activated concurrently".to_string(),
                );
            }
            return StoreError::DuplicateKey(constraint);
        }
        if db.is_foreign_key_violation() {
            return StoreError::NotFound(constraint);
        }
    }
    tracing::error!(error = %error, "Database error");
    StoreError::Database(error.to_string())
}
