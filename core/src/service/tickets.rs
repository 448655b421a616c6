//! Ticket lifecycle: pool initialization, reservation, sale, admin override.

use crate::content::SiteSettings;
use crate::environment::Clock;
use crate::error::{ServiceError, UnavailableTicket};
use crate::handoff::{reservation_message, whatsapp_link};
use crate::pricing::{self, Quote};
use crate::service::content::load_settings;
use crate::store::{ContentStore, PromotionStore, RaffleStore, StoreError, Stores, TicketStore};
use crate::ticket::{TicketChange, fresh_pool};
use crate::types::{
    BuyerInfo, Page, Raffle, RaffleId, StatusSummary, Ticket, TicketNumber, TicketQuery,
    TicketStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Most ticket numbers accepted in one reservation, sale or status update.
pub const MAX_BATCH: usize = 100;

const INIT_ATTEMPTS: u32 = 3;

/// Result of initializing a raffle's pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializedPool {
    /// Raffle initialized
    pub raffle_id: RaffleId,
    /// Tickets created
    pub created: u64,
    /// Tickets removed from the previous pool
    pub deleted: u64,
}

/// A successful reservation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Raffle the tickets belong to
    pub raffle_id: RaffleId,
    /// Reserved numbers, ordered
    pub numbers: Vec<TicketNumber>,
    /// Price for the reserved tickets
    pub quote: Quote,
    /// Chat link to complete payment, when a WhatsApp number is configured
    pub whatsapp_link: Option<String>,
}

/// A completed sale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReceipt {
    /// Raffle the tickets belong to
    pub raffle_id: RaffleId,
    /// Sold numbers, ordered
    pub numbers: Vec<TicketNumber>,
    /// Buyer the tickets were attributed to
    pub buyer: BuyerInfo,
    /// Price for the sold tickets
    pub quote: Quote,
}

/// Result of an administrative status override.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkStatusUpdate {
    /// Tickets updated
    pub updated: u64,
    /// Status they now have
    pub status: TicketStatus,
}

/// Drives tickets through their lifecycle.
#[derive(Clone)]
pub struct TicketService {
    raffles: Arc<dyn RaffleStore>,
    tickets: Arc<dyn TicketStore>,
    promotions: Arc<dyn PromotionStore>,
    content: Arc<dyn ContentStore>,
    clock: Arc<dyn Clock>,
}

impl TicketService {
    /// Build from the shared stores.
    #[must_use]
    pub fn new(stores: &Stores, clock: Arc<dyn Clock>) -> Self {
        Self {
            raffles: stores.raffles.clone(),
            tickets: stores.tickets.clone(),
            promotions: stores.promotions.clone(),
            content: stores.content.clone(),
            clock,
        }
    }

    /// Replace the raffle's pool with `total_tickets` available tickets.
    ///
    /// Runs in one storage transaction. A duplicate-key failure means a
    /// concurrent initialization of the same raffle won; it is retried a
    /// bounded number of times before being reported as a data-integrity
    /// error.
    ///
    /// # Errors
    ///
    /// Raffle not found, persistent duplicate keys, or storage errors.
    pub async fn initialize_pool(&self, raffle_id: RaffleId) -> Result<InitializedPool, ServiceError> {
        let raffle = self.raffle(raffle_id).await?;
        let mut last_conflict = String::new();

        for attempt in 1..=INIT_ATTEMPTS {
            let pool = fresh_pool(raffle.id, raffle.total_tickets, self.clock.now());
            match self.tickets.replace_pool(raffle.id, pool).await {
                Ok(replacement) => {
                    tracing::info!(
                        raffle_id = %raffle.id,
                        created = replacement.created,
                        deleted = replacement.deleted,
                        attempt,
                        "Ticket pool initialized"
                    );
                    return Ok(InitializedPool {
                        raffle_id: raffle.id,
                        created: replacement.created,
                        deleted: replacement.deleted,
                    });
                }
                Err(StoreError::DuplicateKey(detail)) => {
                    tracing::warn!(raffle_id = %raffle.id, attempt, %detail, "Duplicate ticket during pool initialization");
                    last_conflict = detail;
                }
                Err(other) => return Err(other.into()),
            }
        }

        tracing::error!(
            raffle_id = %raffle.id,
            attempts = INIT_ATTEMPTS,
            conflict = %last_conflict,
            "Ticket pool initialization keeps hitting duplicate keys; manual intervention required"
        );
        Err(ServiceError::DataIntegrity(format!(
            "ticket pool for raffle {} could not be initialized after {INIT_ATTEMPTS} attempts",
            raffle.id
        )))
    }

    /// Reserve every requested ticket, or none.
    ///
    /// # Errors
    ///
    /// Invalid numbers, unknown numbers, any ticket not available, or storage errors.
    pub async fn reserve(&self, raffle_id: RaffleId, requested: &[String]) -> Result<Reservation, ServiceError> {
        let raffle = self.raffle(raffle_id).await?;
        let numbers = resolve_numbers(&raffle, requested)?;
        let change = TicketChange::reserve();

        let current = self.load(raffle.id, &numbers).await?;
        let blocked = blocked_by(&current, &change);
        if !blocked.is_empty() {
            tracing::warn!(raffle_id = %raffle.id, blocked = blocked.len(), "Reservation rejected");
            return Err(ServiceError::TicketsUnavailable { tickets: blocked });
        }

        let quote = self.quote_for(&raffle, &numbers).await?;
        self.apply(&raffle, &numbers, &change).await?;

        let whatsapp_link = self
            .settings()
            .await
            .and_then(|settings| settings.whatsapp_number)
            .and_then(|phone| {
                whatsapp_link(&phone, &reservation_message(&raffle.name, &numbers, quote.total))
            });

        tracing::info!(raffle_id = %raffle.id, count = numbers.len(), total = %quote.total, "Tickets reserved");
        Ok(Reservation {
            raffle_id: raffle.id,
            numbers,
            quote,
            whatsapp_link,
        })
    }

    /// Mark every requested ticket sold to `buyer`, or none.
    ///
    /// Available and reserved tickets can be sold; the batch is rejected if
    /// any ticket is already sold.
    ///
    /// # Errors
    ///
    /// Missing buyer name, invalid or unknown numbers, any ticket already
    /// sold, or storage errors.
    pub async fn sell(
        &self,
        raffle_id: RaffleId,
        requested: &[String],
        buyer: BuyerInfo,
    ) -> Result<SaleReceipt, ServiceError> {
        let buyer = clean_buyer(buyer)?;
        let raffle = self.raffle(raffle_id).await?;
        let numbers = resolve_numbers(&raffle, requested)?;
        let change = TicketChange::sell(buyer.clone());

        let current = self.load(raffle.id, &numbers).await?;
        let blocked = blocked_by(&current, &change);
        if !blocked.is_empty() {
            tracing::warn!(raffle_id = %raffle.id, blocked = blocked.len(), "Sale rejected");
            return Err(ServiceError::TicketsUnavailable { tickets: blocked });
        }

        let quote = self.quote_for(&raffle, &numbers).await?;
        self.apply(&raffle, &numbers, &change).await?;

        tracing::info!(raffle_id = %raffle.id, count = numbers.len(), total = %quote.total, "Tickets sold");
        Ok(SaleReceipt {
            raffle_id: raffle.id,
            numbers,
            buyer,
            quote,
        })
    }

    /// Administrative override: set `status` on every requested ticket.
    ///
    /// Moving to available clears buyer data. `notes`, when given, replace
    /// the tickets' notes.
    ///
    /// # Errors
    ///
    /// Invalid or unknown numbers, or storage errors.
    pub async fn set_status(
        &self,
        raffle_id: RaffleId,
        requested: &[String],
        status: TicketStatus,
        notes: Option<String>,
    ) -> Result<BulkStatusUpdate, ServiceError> {
        let raffle = self.raffle(raffle_id).await?;
        let numbers = resolve_numbers(&raffle, requested)?;
        self.load(raffle.id, &numbers).await?;

        let change = TicketChange::set_status(status, notes);
        let updated = self.apply(&raffle, &numbers, &change).await?;

        tracing::info!(raffle_id = %raffle.id, updated, %status, "Ticket status overridden");
        Ok(BulkStatusUpdate { updated, status })
    }

    /// Ticket counts per status.
    ///
    /// # Errors
    ///
    /// Raffle not found or storage errors.
    pub async fn summary(&self, raffle_id: RaffleId) -> Result<StatusSummary, ServiceError> {
        let raffle = self.raffle(raffle_id).await?;
        Ok(self.tickets.summary(raffle.id).await?)
    }

    /// A page of tickets.
    ///
    /// # Errors
    ///
    /// Raffle not found, a page size outside `1..=1000`, or storage errors.
    pub async fn list(&self, raffle_id: RaffleId, query: TicketQuery) -> Result<Page<Ticket>, ServiceError> {
        if query.page_size == 0 || query.page_size > TicketQuery::MAX_PAGE_SIZE {
            return Err(ServiceError::validation(format!(
                "page_size must be between 1 and {}",
                TicketQuery::MAX_PAGE_SIZE
            )));
        }
        let raffle = self.raffle(raffle_id).await?;
        Ok(self.tickets.list(raffle.id, query).await?)
    }

    /// One ticket by number. Unpadded numbers are accepted.
    ///
    /// # Errors
    ///
    /// Raffle or ticket not found, an invalid number, or storage errors.
    pub async fn get(&self, raffle_id: RaffleId, number: &str) -> Result<Ticket, ServiceError> {
        let raffle = self.raffle(raffle_id).await?;
        let number = TicketNumber::normalize(number, raffle.total_tickets)
            .ok_or_else(|| invalid_numbers(&[number]))?;
        self.tickets
            .get(raffle.id, &number)
            .await?
            .ok_or_else(|| ServiceError::not_found("ticket", number))
    }

    /// Numbers still available, ordered.
    ///
    /// # Errors
    ///
    /// Raffle not found or storage errors.
    pub async fn available_numbers(&self, raffle_id: RaffleId) -> Result<Vec<TicketNumber>, ServiceError> {
        let raffle = self.raffle(raffle_id).await?;
        Ok(self.tickets.available_numbers(raffle.id).await?)
    }

    async fn raffle(&self, raffle_id: RaffleId) -> Result<Raffle, ServiceError> {
        self.raffles
            .get(raffle_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("raffle", raffle_id))
    }

    /// Read the requested tickets, failing if any number has no ticket.
    async fn load(&self, raffle_id: RaffleId, numbers: &[TicketNumber]) -> Result<Vec<Ticket>, ServiceError> {
        let found = self.tickets.find(raffle_id, numbers).await?;
        let missing = missing_numbers(numbers, &found);
        if missing.is_empty() {
            Ok(found)
        } else {
            Err(ServiceError::UnknownTickets { numbers: missing })
        }
    }

    /// Run the all-or-nothing update and explain a lost race.
    async fn apply(
        &self,
        raffle: &Raffle,
        numbers: &[TicketNumber],
        change: &TicketChange,
    ) -> Result<u64, ServiceError> {
        let expected = numbers.len() as u64;
        let updated = self
            .tickets
            .apply_all(raffle.id, numbers, change, self.clock.now())
            .await?;
        if updated == expected {
            return Ok(updated);
        }

        tracing::warn!(raffle_id = %raffle.id, expected, updated, "Ticket update lost a concurrent race");
        let current = self.load(raffle.id, numbers).await?;
        let blocked = blocked_by(&current, change);
        if blocked.is_empty() {
            Err(ServiceError::validation(
                "tickets changed while updating, please retry",
            ))
        } else {
            Err(ServiceError::TicketsUnavailable { tickets: blocked })
        }
    }

    async fn quote_for(&self, raffle: &Raffle, numbers: &[TicketNumber]) -> Result<Quote, ServiceError> {
        let promotions = self.promotions.list_for_raffle(raffle.id).await?;
        let quantity = u32::try_from(numbers.len()).unwrap_or(u32::MAX);
        Ok(pricing::quote(quantity, raffle.ticket_price, &promotions))
    }

    async fn settings(&self) -> Option<SiteSettings> {
        load_settings(self.content.as_ref()).await
    }
}

/// Normalize, validate and deduplicate requested numbers.
fn resolve_numbers(raffle: &Raffle, requested: &[String]) -> Result<Vec<TicketNumber>, ServiceError> {
    if requested.is_empty() {
        return Err(ServiceError::validation("at least one ticket number is required"));
    }

    let mut numbers = BTreeSet::new();
    let mut invalid = Vec::new();
    for raw in requested {
        match TicketNumber::normalize(raw, raffle.total_tickets) {
            Some(number) => {
                numbers.insert(number);
            }
            None => invalid.push(raw.as_str()),
        }
    }

    if !invalid.is_empty() {
        return Err(invalid_numbers(&invalid));
    }
    if numbers.len() > MAX_BATCH {
        return Err(ServiceError::validation(format!(
            "at most {MAX_BATCH} tickets per request"
        )));
    }
    Ok(numbers.into_iter().collect())
}

fn invalid_numbers(raw: &[&str]) -> ServiceError {
    ServiceError::validation(format!("invalid ticket numbers: {}", raw.join(", ")))
}

fn missing_numbers(requested: &[TicketNumber], found: &[Ticket]) -> Vec<TicketNumber> {
    let found: BTreeSet<&TicketNumber> = found.iter().map(|t| &t.number).collect();
    requested
        .iter()
        .filter(|n| !found.contains(n))
        .cloned()
        .collect()
}

fn blocked_by(tickets: &[Ticket], change: &TicketChange) -> Vec<UnavailableTicket> {
    tickets
        .iter()
        .filter(|t| !change.guard.matches(t.status))
        .map(|t| UnavailableTicket {
            number: t.number.clone(),
            status: t.status,
        })
        .collect()
}

fn clean_buyer(buyer: BuyerInfo) -> Result<BuyerInfo, ServiceError> {
    let name = buyer.name.trim().to_string();
    if name.is_empty() {
        return Err(ServiceError::validation("buyer name is required"));
    }
    let optional = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    Ok(BuyerInfo {
        name,
        email: optional(buyer.email),
        phone: optional(buyer.phone),
        transaction_id: optional(buyer.transaction_id),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Money;
    use chrono::Utc;

    fn raffle(total: u32) -> Raffle {
        let now = Utc::now();
        Raffle {
            id: RaffleId::new(),
            name: "Moto".to_string(),
            prize_description: String::new(),
            total_tickets: total,
            ticket_price: Money::from_cents(500),
            draw_method: String::new(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolve_collapses_duplicates_and_pads() {
        let numbers = resolve_numbers(&raffle(100), &strings(&["7", "007", "12"])).unwrap();
        assert_eq!(numbers, vec![TicketNumber::from("007"), TicketNumber::from("012")]);
    }

    #[test]
    fn resolve_rejects_empty_and_invalid() {
        assert!(matches!(
            resolve_numbers(&raffle(100), &[]),
            Err(ServiceError::Validation(_))
        ));
        let err = resolve_numbers(&raffle(100), &strings(&["1", "x", "100"])).unwrap_err();
        assert_eq!(err.to_string(), "invalid ticket numbers: x, 100");
    }

    #[test]
    fn resolve_caps_batch_after_deduplication() {
        let many: Vec<String> = (0..=MAX_BATCH).map(|n| n.to_string()).collect();
        assert!(resolve_numbers(&raffle(1000), &many).is_err());

        let mut repeated: Vec<String> = (0..MAX_BATCH).map(|n| n.to_string()).collect();
        repeated.extend(strings(&["0", "1"]));
        assert_eq!(resolve_numbers(&raffle(1000), &repeated).unwrap().len(), MAX_BATCH);
    }

    #[test]
    fn blocked_lists_guard_failures_only() {
        let r = raffle(3);
        let now = Utc::now();
        let mut sold = Ticket::available(r.id, "001".into(), now);
        sold.status = TicketStatus::Sold;
        let mut reserved = Ticket::available(r.id, "002".into(), now);
        reserved.status = TicketStatus::Reserved;
        let tickets = vec![Ticket::available(r.id, "000".into(), now), sold, reserved];

        let for_sale = blocked_by(&tickets, &TicketChange::sell(BuyerInfo::default()));
        assert_eq!(for_sale.len(), 1);
        assert_eq!(for_sale[0].status, TicketStatus::Sold);

        let for_reservation = blocked_by(&tickets, &TicketChange::reserve());
        assert_eq!(for_reservation.len(), 2);
    }

    #[test]
    fn buyer_name_is_required_and_blanks_dropped() {
        assert!(clean_buyer(BuyerInfo { name: "  ".to_string(), ..BuyerInfo::default() }).is_err());
        let buyer = clean_buyer(BuyerInfo {
            name: " Ana ".to_string(),
            email: Some(" ".to_string()),
            phone: Some(" 555 ".to_string()),
            transaction_id: None,
        })
        .unwrap();
        assert_eq!(buyer.name, "Ana");
        assert_eq!(buyer.email, None);
        assert_eq!(buyer.phone.as_deref(), Some("555"));
    }
}
