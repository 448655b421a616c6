//! Store traits for raffle persistence.
//!
//! Every trait is dyn-compatible (explicit `Pin<Box<dyn Future>>` returns) so
//! services can hold `Arc<dyn RaffleStore>` and friends. Two implementations
//! exist:
//!
//! - `PostgresStore` (in `rifa-postgres`): production, one SQL transaction
//!   per multi-row operation
//! - `InMemoryDatabase` (in `rifa-testing`): one mutex critical section per
//!   operation, same observable semantics
//!
//! # All-or-nothing ticket updates
//!
//! [`TicketStore::apply_all`] is the only primitive that changes ticket
//! status. It updates every requested ticket whose status matches the
//! change's guard; if that count differs from the number requested, the
//! update is rolled back and `0` is returned. Callers treat `0` as "somebody
//! else got there first" and re-read the tickets to report why.

use crate::content::{ContentBlock, ContentKey};
use crate::ticket::TicketChange;
use crate::types::{
    Page, Promotion, PromotionId, Raffle, RaffleId, StatusSummary, Ticket, TicketNumber,
    TicketQuery, User, UserId,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by store implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The record to update does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (raffle name, username, ticket number).
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored value could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Boxed future returned by every store method.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Counts reported by a pool replacement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PoolReplacement {
    /// Tickets removed
    pub deleted: u64,
    /// Tickets inserted
    pub created: u64,
}

/// Raffle persistence.
///
/// Saving a raffle with `active = true` deactivates every other raffle in the
/// same atomic operation.
pub trait RaffleStore: Send + Sync {
    /// Insert a new raffle.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateKey`] if the name is taken.
    fn insert(&self, raffle: Raffle) -> StoreFuture<'_, Raffle>;

    /// Fetch a raffle by id.
    ///
    /// # Errors
    ///
    /// Storage failures only; a missing raffle is `Ok(None)`.
    fn get(&self, id: RaffleId) -> StoreFuture<'_, Option<Raffle>>;

    /// The active raffle, if any.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn find_active(&self) -> StoreFuture<'_, Option<Raffle>>;

    /// All raffles, newest first.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn list(&self) -> StoreFuture<'_, Vec<Raffle>>;

    /// Replace a stored raffle.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if it does not exist,
    /// [`StoreError::DuplicateKey`] if the new name is taken.
    fn update(&self, raffle: Raffle) -> StoreFuture<'_, Raffle>;

    /// Delete a raffle with its tickets and promotions. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn delete(&self, id: RaffleId) -> StoreFuture<'_, bool>;
}

/// Ticket persistence.
pub trait TicketStore: Send + Sync {
    /// Atomically delete every ticket of `raffle_id` and insert `tickets`.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateKey`] if two inserted tickets share a number
    /// (or a concurrent replacement inserted first); nothing is changed.
    fn replace_pool(
        &self,
        raffle_id: RaffleId,
        tickets: Vec<Ticket>,
    ) -> StoreFuture<'_, PoolReplacement>;

    /// Tickets of `raffle_id` among `numbers`, ordered by number. Unknown numbers are skipped.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn find<'a>(
        &'a self,
        raffle_id: RaffleId,
        numbers: &'a [TicketNumber],
    ) -> StoreFuture<'a, Vec<Ticket>>;

    /// One ticket.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn get<'a>(
        &'a self,
        raffle_id: RaffleId,
        number: &'a TicketNumber,
    ) -> StoreFuture<'a, Option<Ticket>>;

    /// A page of tickets ordered by number.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn list(&self, raffle_id: RaffleId, query: TicketQuery) -> StoreFuture<'_, Page<Ticket>>;

    /// Numbers of every available ticket, ordered.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn available_numbers(&self, raffle_id: RaffleId) -> StoreFuture<'_, Vec<TicketNumber>>;

    /// Apply `change` to all of `numbers` or to none of them.
    ///
    /// Returns `numbers.len()` on success and `0` when any ticket is missing
    /// or fails the guard. `numbers` must be free of duplicates.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn apply_all<'a>(
        &'a self,
        raffle_id: RaffleId,
        numbers: &'a [TicketNumber],
        change: &'a TicketChange,
        now: DateTime<Utc>,
    ) -> StoreFuture<'a, u64>;

    /// Ticket counts per status.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn summary(&self, raffle_id: RaffleId) -> StoreFuture<'_, StatusSummary>;
}

/// Promotion persistence.
pub trait PromotionStore: Send + Sync {
    /// Insert a promotion.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the raffle does not exist.
    fn insert(&self, promotion: Promotion) -> StoreFuture<'_, Promotion>;

    /// Fetch a promotion.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn get(&self, id: PromotionId) -> StoreFuture<'_, Option<Promotion>>;

    /// Promotions of a raffle ordered by quantity.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn list_for_raffle(&self, raffle_id: RaffleId) -> StoreFuture<'_, Vec<Promotion>>;

    /// Replace a stored promotion.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if it does not exist.
    fn update(&self, promotion: Promotion) -> StoreFuture<'_, Promotion>;

    /// Delete a promotion. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn delete(&self, id: PromotionId) -> StoreFuture<'_, bool>;
}

/// User account persistence.
pub trait UserStore: Send + Sync {
    /// Insert a user.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateKey`] if the username is taken.
    fn insert(&self, user: User) -> StoreFuture<'_, User>;

    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn get(&self, id: UserId) -> StoreFuture<'_, Option<User>>;

    /// Fetch a user by username.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn find_by_username<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<User>>;

    /// All users ordered by username.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn list(&self) -> StoreFuture<'_, Vec<User>>;

    /// Replace a stored user.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if it does not exist.
    fn update(&self, user: User) -> StoreFuture<'_, User>;

    /// Delete a user. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn delete(&self, id: UserId) -> StoreFuture<'_, bool>;
}

/// Content block persistence.
pub trait ContentStore: Send + Sync {
    /// Fetch a block.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn get(&self, key: ContentKey) -> StoreFuture<'_, Option<ContentBlock>>;

    /// Insert or replace a block.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn put(&self, block: ContentBlock) -> StoreFuture<'_, ContentBlock>;
}

/// Every store the services need, as shared trait objects.
#[derive(Clone)]
pub struct Stores {
    /// Raffles
    pub raffles: Arc<dyn RaffleStore>,
    /// Tickets
    pub tickets: Arc<dyn TicketStore>,
    /// Promotions
    pub promotions: Arc<dyn PromotionStore>,
    /// Users
    pub users: Arc<dyn UserStore>,
    /// Content blocks
    pub content: Arc<dyn ContentStore>,
}

impl Stores {
    /// Use one backend for every store.
    #[must_use]
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: RaffleStore + TicketStore + PromotionStore + UserStore + ContentStore + 'static,
    {
        Self {
            raffles: backend.clone(),
            tickets: backend.clone(),
            promotions: backend.clone(),
            users: backend.clone(),
            content: backend,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
