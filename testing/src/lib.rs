//! # Rifa Testing
//!
//! Testing utilities for the Rifa backend.
//!
//! This crate provides:
//! - [`InMemoryDatabase`]: every store trait in memory, with fault injection
//! - [`FixedClock`] and [`test_clock`]: deterministic time
//! - [`fixtures`]: builders for raffles, promotions and users
//! - [`Harness`]: stores, clock and services wired together
//! - [`properties`]: proptest strategies for domain inputs
//!
//! ## Example
//!
//! ```ignore
//! use rifa_testing::Harness;
//!
//! #[tokio::test]
//! async fn reserve_two() {
//!     let harness = Harness::new();
//!     let raffle = harness.initialized_raffle("Moto", 3).await;
//!     let reservation = harness
//!         .tickets()
//!         .reserve(raffle.id, &["000".to_string(), "001".to_string()])
//!         .await
//!         .unwrap();
//!     assert_eq!(reservation.numbers.len(), 2);
//! }
//! ```

use chrono::{DateTime, Utc};
use rifa_core::environment::Clock;

mod memory;

pub use memory::InMemoryDatabase;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use rifa_testing::mocks::FixedClock;
    /// use rifa_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Builders for domain records.
///
/// Records are built directly, bypassing service validation, so tests can
/// seed stores with exactly the state they need.
pub mod fixtures {
    use super::mocks::test_clock;
    use rifa_core::environment::Clock;
    use rifa_core::{
        Money, NewPromotion, NewRaffle, Promotion, PromotionId, Raffle, RaffleId, Role, User, UserId,
    };

    /// Price every fixture raffle uses: 5.00
    pub const TICKET_PRICE: Money = Money::from_cents(500);

    /// Inactive raffle with `total` tickets at [`TICKET_PRICE`]
    #[must_use]
    pub fn raffle(name: &str, total: u32) -> Raffle {
        let now = test_clock().now();
        Raffle {
            id: RaffleId::new(),
            name: name.to_string(),
            prize_description: format!("Prize of {name}"),
            total_tickets: total,
            ticket_price: TICKET_PRICE,
            draw_method: "Lotería Nacional".to_string(),
            active: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Service input for a raffle with `total` tickets at [`TICKET_PRICE`]
    #[must_use]
    pub fn new_raffle(name: &str, total: u32) -> NewRaffle {
        NewRaffle {
            name: name.to_string(),
            prize_description: format!("Prize of {name}"),
            total_tickets: total,
            ticket_price: TICKET_PRICE,
            draw_method: "Lotería Nacional".to_string(),
            active: false,
        }
    }

    /// Bundle of `quantity` tickets for `cents`
    #[must_use]
    pub fn promotion(raffle_id: RaffleId, quantity: u32, cents: u64) -> Promotion {
        Promotion {
            id: PromotionId::new(),
            raffle_id,
            quantity,
            price: Money::from_cents(cents),
            description: format!("{quantity} tickets"),
            created_at: test_clock().now(),
        }
    }

    /// Service input for a bundle
    #[must_use]
    pub fn new_promotion(quantity: u32, cents: u64) -> NewPromotion {
        NewPromotion {
            quantity,
            price: Money::from_cents(cents),
            description: format!("{quantity} tickets"),
        }
    }

    /// Active user whose password hash is a placeholder (cannot log in)
    #[must_use]
    pub fn user(username: &str, role: Role) -> User {
        let now = test_clock().now();
        User {
            id: UserId::new(),
            username: username.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use super::InMemoryDatabase;
    use super::fixtures;
    use super::mocks::{FixedClock, test_clock};
    use rifa_core::environment::Clock;
    use rifa_core::service::{ContentService, PromotionService, RaffleService, TicketService};
    use rifa_core::{Raffle, Stores};
    use std::sync::Arc;

    /// In-memory stores, a fixed clock and the services built on them.
    #[derive(Clone)]
    pub struct Harness {
        /// Backing database, for fault injection and direct inspection
        pub db: Arc<InMemoryDatabase>,
        /// Store bundle handed to services
        pub stores: Stores,
        /// Clock handed to services
        pub clock: Arc<dyn Clock>,
    }

    impl Harness {
        /// Empty database with [`test_clock`]
        #[must_use]
        pub fn new() -> Self {
            Self::with_clock(test_clock())
        }

        /// Empty database with a specific clock
        #[must_use]
        pub fn with_clock(clock: FixedClock) -> Self {
            let db = Arc::new(InMemoryDatabase::new());
            Self {
                stores: Stores::from_backend(db.clone()),
                db,
                clock: Arc::new(clock),
            }
        }

        /// Raffle service
        #[must_use]
        pub fn raffles(&self) -> RaffleService {
            RaffleService::new(&self.stores, self.clock.clone())
        }

        /// Ticket service
        #[must_use]
        pub fn tickets(&self) -> TicketService {
            TicketService::new(&self.stores, self.clock.clone())
        }

        /// Promotion service
        #[must_use]
        pub fn promotions(&self) -> PromotionService {
            PromotionService::new(&self.stores, self.clock.clone())
        }

        /// Content service
        #[must_use]
        pub fn content(&self) -> ContentService {
            ContentService::new(&self.stores, self.clock.clone())
        }

        /// Create a raffle through the service and initialize its pool.
        ///
        /// # Panics
        ///
        /// Panics if creation or initialization fails.
        #[allow(clippy::expect_used)]
        pub async fn initialized_raffle(&self, name: &str, total: u32) -> Raffle {
            let raffle = self
                .raffles()
                .create(fixtures::new_raffle(name, total))
                .await
                .expect("fixture raffle should be valid");
            self.tickets()
                .initialize_pool(raffle.id)
                .await
                .expect("fixture pool should initialize");
            raffle
        }
    }

    impl Default for Harness {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Install a fmt subscriber honoring `RUST_LOG`, once per test binary.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// An operation on the raffle set, for single-active checks.
    #[derive(Clone, Debug)]
    pub enum RaffleOp {
        /// Create a raffle, optionally active
        Create {
            /// Activate on creation
            active: bool,
        },
        /// Set the active flag of the n-th created raffle (modulo count)
        SetActive {
            /// Index into created raffles
            index: usize,
            /// New flag
            active: bool,
        },
    }

    /// Random sequences of raffle operations.
    pub fn raffle_ops(max_len: usize) -> impl Strategy<Value = Vec<RaffleOp>> {
        let op = prop_oneof![
            any::<bool>().prop_map(|active| RaffleOp::Create { active }),
            (0usize..16, any::<bool>()).prop_map(|(index, active)| RaffleOp::SetActive { index, active }),
        ];
        prop::collection::vec(op, 1..max_len)
    }

    /// Ticket number inputs for a pool of `total`, unpadded or padded.
    pub fn ticket_inputs(total: u32, max_len: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            (0..total, any::<bool>()).prop_map(|(n, padded)| {
                if padded { format!("{n:03}") } else { n.to_string() }
            }),
            1..max_len,
        )
    }
}

// Re-export commonly used items
pub use helpers::Harness;
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }
}
