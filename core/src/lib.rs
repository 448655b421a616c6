//! # Rifa Core
//!
//! Domain types, store traits and services for the Rifa raffle backend.
//!
//! Everything with a business rule lives here: the ticket state machine,
//! pool numbering, promotion pricing, and the services that drive them.
//! Persistence is abstracted behind the traits in [`store`]; the
//! `rifa-postgres` crate provides the production implementation and
//! `rifa-testing` an in-memory one with the same semantics.
//!
//! ## Ticket lifecycle
//!
//! ```text
//!              reserve (guard: available)
//!   available ───────────────────────────▶ reserved
//!       │  ▲                                  │
//!       │  └──────── reset (unguarded) ───────┤
//!       │                                     │ sell (guard: not sold)
//!       └──────── sell (guard: not sold) ─────┴──▶ sold
//! ```
//!
//! Every guarded transition is applied by the store as one conditional
//! update over the whole batch: either every requested ticket matches the
//! guard and changes, or nothing changes.
//!
//! ## Example
//!
//! ```ignore
//! use rifa_core::service::TicketService;
//!
//! let created = tickets.initialize_pool(raffle.id).await?;
//! let reserved = tickets.reserve(raffle.id, &["000".to_string(), "001".to_string()]).await?;
//! ```

pub mod content;
pub mod error;
pub mod handoff;
pub mod pricing;
pub mod service;
pub mod store;
pub mod ticket;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use error::{ServiceError, UnavailableTicket};
pub use store::{StoreError, Stores};
pub use types::*;

/// Environment module - abstractions over the outside world.
///
/// Services never call `Utc::now()` directly; they ask the injected
/// [`Clock`](environment::Clock) so tests can pin time.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use rifa_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let now = clock.now();
    /// assert!(now.timestamp() > 0);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
