//! Application state for the Rifa HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers:
//! - Domain services (raffles, tickets, promotions, content)
//! - The account service (sessions and users)
//! - Dependency checks for the readiness probe

use super::health::DependencyCheck;
use rifa_auth::{AccountService, AuthConfig, SessionStore};
use rifa_core::Stores;
use rifa_core::environment::Clock;
use rifa_core::service::{ContentService, PromotionService, RaffleService, TicketService};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Every field is a service holding `Arc`s, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Raffle lifecycle
    pub raffles: RaffleService,
    /// Ticket pools, reservations and sales
    pub tickets: TicketService,
    /// Promotion bundles and price quotes
    pub promotions: PromotionService,
    /// Site content blocks
    pub content: ContentService,
    /// Accounts and sessions
    pub accounts: AccountService,
    /// Dependencies probed by `/ready`
    pub checks: Vec<Arc<dyn DependencyCheck>>,
}

impl AppState {
    /// Build every service over the same stores and clock.
    #[must_use]
    pub fn new(
        stores: &Stores,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            raffles: RaffleService::new(stores, clock.clone()),
            tickets: TicketService::new(stores, clock.clone()),
            promotions: PromotionService::new(stores, clock.clone()),
            content: ContentService::new(stores, clock.clone()),
            accounts: AccountService::new(stores, sessions, clock, auth),
            checks: Vec::new(),
        }
    }

    /// Add a dependency to the readiness probe.
    #[must_use]
    pub fn with_check(mut self, check: Arc<dyn DependencyCheck>) -> Self {
        self.checks.push(check);
        self
    }
}
