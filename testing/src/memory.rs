//! In-memory implementation of every store trait.
//!
//! All tables sit behind one mutex, so each store call is a single critical
//! section. That gives the same all-or-nothing behavior the PostgreSQL store
//! gets from transactions, including the single-active raffle rule and the
//! conditional multi-ticket update.
//!
//! Fault injection hooks let tests drive the failure paths that are hard to
//! hit against a real database (concurrent initialization, lost update races,
//! an unreachable content table).

use futures::future;
use rifa_core::content::{ContentBlock, ContentKey};
use rifa_core::store::{
    ContentStore, PoolReplacement, PromotionStore, RaffleStore, StoreError, StoreFuture,
    TicketStore, UserStore,
};
use rifa_core::ticket::TicketChange;
use rifa_core::{
    DateTime, Page, Promotion, PromotionId, Raffle, RaffleId, StatusSummary, Ticket, TicketNumber,
    TicketQuery, TicketStatus, User, UserId, Utc,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    raffles: HashMap<RaffleId, Raffle>,
    tickets: HashMap<RaffleId, BTreeMap<TicketNumber, Ticket>>,
    promotions: HashMap<PromotionId, Promotion>,
    users: HashMap<UserId, User>,
    content: HashMap<ContentKey, ContentBlock>,
    faults: Faults,
}

#[derive(Default)]
struct Faults {
    pool_conflicts: u32,
    content_unavailable: bool,
    promotions_unavailable: bool,
    interference: Option<(RaffleId, TicketNumber, TicketStatus)>,
}

/// In-memory database implementing all store traits.
///
/// # Example
///
/// ```
/// use rifa_testing::InMemoryDatabase;
/// use rifa_core::Stores;
/// use std::sync::Arc;
///
/// let stores = Stores::from_backend(Arc::new(InMemoryDatabase::new()));
/// ```
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
}

impl InMemoryDatabase {
    /// Create an empty database
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` pool replacements fail with a duplicate key,
    /// as if a concurrent initialization had inserted first.
    pub fn fail_pool_replacements(&self, times: u32) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.faults.pool_conflicts = times;
        }
    }

    /// Make every content block read fail with a database error.
    pub fn set_content_unavailable(&self, unavailable: bool) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.faults.content_unavailable = unavailable;
        }
    }

    /// Make every promotion read fail until turned off.
    pub fn set_promotions_unavailable(&self, unavailable: bool) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.faults.promotions_unavailable = unavailable;
        }
    }

    /// Just before the next conditional ticket update, move one ticket to
    /// `status`, as if another request changed it after our pre-check.
    pub fn interfere_before_next_update(&self, raffle_id: RaffleId, number: TicketNumber, status: TicketStatus) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.faults.interference = Some((raffle_id, number, status));
        }
    }

    /// Number of tickets stored for a raffle.
    #[must_use]
    pub fn ticket_count(&self, raffle_id: RaffleId) -> usize {
        self.tables
            .lock()
            .map(|t| t.tickets.get(&raffle_id).map_or(0, BTreeMap::len))
            .unwrap_or_default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut guard = self.lock()?;
        f(&mut guard)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Database("in-memory database lock poisoned".to_string()))
    }
}

fn ready<'a, T: Send + 'a>(result: Result<T, StoreError>) -> StoreFuture<'a, T> {
    Box::pin(future::ready(result))
}

fn name_taken(tables: &Tables, raffle: &Raffle) -> bool {
    tables
        .raffles
        .values()
        .any(|r| r.id != raffle.id && r.name == raffle.name)
}

fn deactivate_others(tables: &mut Tables, keep: RaffleId) {
    for other in tables.raffles.values_mut() {
        if other.id != keep {
            other.active = false;
        }
    }
}

// ============================================================================
// Raffles
// ============================================================================

impl RaffleStore for InMemoryDatabase {
    fn insert(&self, raffle: Raffle) -> StoreFuture<'_, Raffle> {
        ready(self.with(|t| {
            if name_taken(t, &raffle) {
                return Err(StoreError::DuplicateKey(format!("raffle name {}", raffle.name)));
            }
            if raffle.active {
                deactivate_others(t, raffle.id);
            }
            t.raffles.insert(raffle.id, raffle.clone());
            Ok(raffle)
        }))
    }

    fn get(&self, id: RaffleId) -> StoreFuture<'_, Option<Raffle>> {
        ready(self.with(|t| Ok(t.raffles.get(&id).cloned())))
    }

    fn find_active(&self) -> StoreFuture<'_, Option<Raffle>> {
        ready(self.with(|t| Ok(t.raffles.values().find(|r| r.active).cloned())))
    }

    fn list(&self) -> StoreFuture<'_, Vec<Raffle>> {
        ready(self.with(|t| {
            let mut raffles: Vec<Raffle> = t.raffles.values().cloned().collect();
            raffles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.name.cmp(&b.name)));
            Ok(raffles)
        }))
    }

    fn update(&self, raffle: Raffle) -> StoreFuture<'_, Raffle> {
        ready(self.with(|t| {
            if !t.raffles.contains_key(&raffle.id) {
                return Err(StoreError::NotFound(format!("raffle {}", raffle.id)));
            }
            if name_taken(t, &raffle) {
                return Err(StoreError::DuplicateKey(format!("raffle name {}", raffle.name)));
            }
            if raffle.active {
                deactivate_others(t, raffle.id);
            }
            t.raffles.insert(raffle.id, raffle.clone());
            Ok(raffle)
        }))
    }

    fn delete(&self, id: RaffleId) -> StoreFuture<'_, bool> {
        ready(self.with(|t| {
            let existed = t.raffles.remove(&id).is_some();
            t.tickets.remove(&id);
            t.promotions.retain(|_, p| p.raffle_id != id);
            Ok(existed)
        }))
    }
}

// ============================================================================
// Tickets
// ============================================================================

impl TicketStore for InMemoryDatabase {
    fn replace_pool(&self, raffle_id: RaffleId, tickets: Vec<Ticket>) -> StoreFuture<'_, PoolReplacement> {
        ready(self.with(|t| {
            if t.faults.pool_conflicts > 0 {
                t.faults.pool_conflicts -= 1;
                return Err(StoreError::DuplicateKey(format!("tickets of raffle {raffle_id}")));
            }

            let mut pool = BTreeMap::new();
            for ticket in tickets {
                let number = ticket.number.clone();
                if pool.insert(number.clone(), ticket).is_some() {
                    return Err(StoreError::DuplicateKey(format!("ticket {number} of raffle {raffle_id}")));
                }
            }

            let created = pool.len() as u64;
            let deleted = t
                .tickets
                .insert(raffle_id, pool)
                .map_or(0, |old| old.len() as u64);
            Ok(PoolReplacement { deleted, created })
        }))
    }

    fn find<'a>(&'a self, raffle_id: RaffleId, numbers: &'a [TicketNumber]) -> StoreFuture<'a, Vec<Ticket>> {
        ready(self.with(|t| {
            let Some(pool) = t.tickets.get(&raffle_id) else {
                return Ok(Vec::new());
            };
            let mut found: Vec<Ticket> = numbers.iter().filter_map(|n| pool.get(n).cloned()).collect();
            found.sort_by(|a, b| a.number.cmp(&b.number));
            found.dedup_by(|a, b| a.number == b.number);
            Ok(found)
        }))
    }

    fn get<'a>(&'a self, raffle_id: RaffleId, number: &'a TicketNumber) -> StoreFuture<'a, Option<Ticket>> {
        ready(self.with(|t| Ok(t.tickets.get(&raffle_id).and_then(|pool| pool.get(number).cloned()))))
    }

    fn list(&self, raffle_id: RaffleId, query: TicketQuery) -> StoreFuture<'_, Page<Ticket>> {
        ready(self.with(|t| {
            let matching: Vec<&Ticket> = t
                .tickets
                .get(&raffle_id)
                .map(|pool| {
                    pool.values()
                        .filter(|ticket| query.status.is_none_or(|s| ticket.status == s))
                        .collect()
                })
                .unwrap_or_default();
            let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
            let items = matching
                .iter()
                .skip(offset)
                .take(query.page_size as usize)
                .map(|ticket| (*ticket).clone())
                .collect();
            Ok(Page {
                items,
                page: query.page,
                page_size: query.page_size,
                total: matching.len() as u64,
            })
        }))
    }

    fn available_numbers(&self, raffle_id: RaffleId) -> StoreFuture<'_, Vec<TicketNumber>> {
        ready(self.with(|t| {
            Ok(t.tickets
                .get(&raffle_id)
                .map(|pool| {
                    pool.values()
                        .filter(|ticket| ticket.status == TicketStatus::Available)
                        .map(|ticket| ticket.number.clone())
                        .collect()
                })
                .unwrap_or_default())
        }))
    }

    fn apply_all<'a>(
        &'a self,
        raffle_id: RaffleId,
        numbers: &'a [TicketNumber],
        change: &'a TicketChange,
        now: DateTime<Utc>,
    ) -> StoreFuture<'a, u64> {
        ready(self.with(|t| {
            if let Some((raffle, number, status)) = t.faults.interference.take() {
                if let Some(ticket) = t.tickets.get_mut(&raffle).and_then(|pool| pool.get_mut(&number)) {
                    ticket.status = status;
                }
            }

            let Some(pool) = t.tickets.get_mut(&raffle_id) else {
                return Ok(0);
            };
            let eligible = numbers
                .iter()
                .all(|n| pool.get(n).is_some_and(|ticket| change.guard.matches(ticket.status)));
            if !eligible {
                return Ok(0);
            }
            for number in numbers {
                if let Some(ticket) = pool.get_mut(number) {
                    ticket.apply(change, now);
                }
            }
            Ok(numbers.len() as u64)
        }))
    }

    fn summary(&self, raffle_id: RaffleId) -> StoreFuture<'_, StatusSummary> {
        ready(self.with(|t| {
            let mut summary = StatusSummary::default();
            if let Some(pool) = t.tickets.get(&raffle_id) {
                for ticket in pool.values() {
                    summary.record(ticket.status);
                }
            }
            Ok(summary)
        }))
    }
}

// ============================================================================
// Promotions
// ============================================================================

impl PromotionStore for InMemoryDatabase {
    fn insert(&self, promotion: Promotion) -> StoreFuture<'_, Promotion> {
        ready(self.with(|t| {
            if !t.raffles.contains_key(&promotion.raffle_id) {
                return Err(StoreError::NotFound(format!("raffle {}", promotion.raffle_id)));
            }
            t.promotions.insert(promotion.id, promotion.clone());
            Ok(promotion)
        }))
    }

    fn get(&self, id: PromotionId) -> StoreFuture<'_, Option<Promotion>> {
        ready(self.with(|t| Ok(t.promotions.get(&id).cloned())))
    }

    fn list_for_raffle(&self, raffle_id: RaffleId) -> StoreFuture<'_, Vec<Promotion>> {
        ready(self.with(|t| {
            if t.faults.promotions_unavailable {
                return Err(StoreError::Database("promotions table unavailable".to_string()));
            }
            let mut promotions: Vec<Promotion> = t
                .promotions
                .values()
                .filter(|p| p.raffle_id == raffle_id)
                .cloned()
                .collect();
            promotions.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.created_at.cmp(&b.created_at)));
            Ok(promotions)
        }))
    }

    fn update(&self, promotion: Promotion) -> StoreFuture<'_, Promotion> {
        ready(self.with(|t| match t.promotions.get_mut(&promotion.id) {
            Some(stored) => {
                *stored = promotion.clone();
                Ok(promotion)
            }
            None => Err(StoreError::NotFound(format!("promotion {}", promotion.id))),
        }))
    }

    fn delete(&self, id: PromotionId) -> StoreFuture<'_, bool> {
        ready(self.with(|t| Ok(t.promotions.remove(&id).is_some())))
    }
}

// ============================================================================
// Users
// ============================================================================

impl UserStore for InMemoryDatabase {
    fn insert(&self, user: User) -> StoreFuture<'_, User> {
        ready(self.with(|t| {
            if t.users.values().any(|u| u.username == user.username) {
                return Err(StoreError::DuplicateKey(format!("username {}", user.username)));
            }
            t.users.insert(user.id, user.clone());
            Ok(user)
        }))
    }

    fn get(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        ready(self.with(|t| Ok(t.users.get(&id).cloned())))
    }

    fn find_by_username<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<User>> {
        ready(self.with(|t| Ok(t.users.values().find(|u| u.username == username).cloned())))
    }

    fn list(&self) -> StoreFuture<'_, Vec<User>> {
        ready(self.with(|t| {
            let mut users: Vec<User> = t.users.values().cloned().collect();
            users.sort_by(|a, b| a.username.cmp(&b.username));
            Ok(users)
        }))
    }

    fn update(&self, user: User) -> StoreFuture<'_, User> {
        ready(self.with(|t| match t.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(user)
            }
            None => Err(StoreError::NotFound(format!("user {}", user.id))),
        }))
    }

    fn delete(&self, id: UserId) -> StoreFuture<'_, bool> {
        ready(self.with(|t| Ok(t.users.remove(&id).is_some())))
    }
}

// ============================================================================
// Content
// ============================================================================

impl ContentStore for InMemoryDatabase {
    fn get(&self, key: ContentKey) -> StoreFuture<'_, Option<ContentBlock>> {
        ready(self.with(|t| {
            if t.faults.content_unavailable {
                return Err(StoreError::Database("content table unavailable".to_string()));
            }
            Ok(t.content.get(&key).cloned())
        }))
    }

    fn put(&self, block: ContentBlock) -> StoreFuture<'_, ContentBlock> {
        ready(self.with(|t| {
            if t.faults.content_unavailable {
                return Err(StoreError::Database("content table unavailable".to_string()));
            }
            t.content.insert(block.key, block.clone());
            Ok(block)
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures;
    use rifa_core::ticket::fresh_pool;

    #[tokio::test]
    async fn apply_all_is_all_or_nothing() {
        let db = InMemoryDatabase::new();
        let raffle = fixtures::raffle("Moto", 3);
        RaffleStore::insert(&db, raffle.clone()).await.unwrap();
        db.replace_pool(raffle.id, fresh_pool(raffle.id, 3, Utc::now())).await.unwrap();

        let first = vec![TicketNumber::from("002")];
        assert_eq!(db.apply_all(raffle.id, &first, &TicketChange::reserve(), Utc::now()).await.unwrap(), 1);

        let both = vec![TicketNumber::from("001"), TicketNumber::from("002")];
        assert_eq!(db.apply_all(raffle.id, &both, &TicketChange::reserve(), Utc::now()).await.unwrap(), 0);

        let summary = db.summary(raffle.id).await.unwrap();
        assert_eq!(summary.reserved, 1);
        assert_eq!(summary.available, 2);
    }

    #[tokio::test]
    async fn activating_a_raffle_deactivates_the_rest() {
        let db = InMemoryDatabase::new();
        let mut first = fixtures::raffle("First", 3);
        first.active = true;
        let mut second = fixtures::raffle("Second", 3);
        second.active = true;

        RaffleStore::insert(&db, first.clone()).await.unwrap();
        RaffleStore::insert(&db, second.clone()).await.unwrap();

        let active = db.find_active().await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
        assert!(!RaffleStore::get(&db, first.id).await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn deleting_a_raffle_cascades() {
        let db = InMemoryDatabase::new();
        let raffle = fixtures::raffle("Moto", 5);
        RaffleStore::insert(&db, raffle.clone()).await.unwrap();
        db.replace_pool(raffle.id, fresh_pool(raffle.id, 5, Utc::now())).await.unwrap();
        PromotionStore::insert(&db, fixtures::promotion(raffle.id, 2, 900)).await.unwrap();

        assert!(RaffleStore::delete(&db, raffle.id).await.unwrap());
        assert_eq!(db.ticket_count(raffle.id), 0);
        assert!(db.list_for_raffle(raffle.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let db = InMemoryDatabase::new();
        UserStore::insert(&db, fixtures::user("ana", rifa_core::Role::User)).await.unwrap();
        let err = UserStore::insert(&db, fixtures::user("ana", rifa_core::Role::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
    }
}
