//! Raffle management.

use crate::environment::Clock;
use crate::error::ServiceError;
use crate::store::{RaffleStore, StoreError, Stores, TicketStore};
use crate::ticket::fresh_pool;
use crate::types::{NewRaffle, Raffle, RaffleChanges, RaffleId};
use std::sync::Arc;

/// Largest pool a raffle may have.
pub const MAX_TOTAL_TICKETS: u32 = 100_000;

const MAX_NAME_LEN: usize = 200;

/// Create, update, list and delete raffles.
///
/// The single-active rule is enforced by the store: saving an active raffle
/// deactivates the rest atomically.
#[derive(Clone)]
pub struct RaffleService {
    raffles: Arc<dyn RaffleStore>,
    tickets: Arc<dyn TicketStore>,
    clock: Arc<dyn Clock>,
}

impl RaffleService {
    /// Build from the shared stores.
    #[must_use]
    pub fn new(stores: &Stores, clock: Arc<dyn Clock>) -> Self {
        Self {
            raffles: stores.raffles.clone(),
            tickets: stores.tickets.clone(),
            clock,
        }
    }

    /// Create a raffle.
    ///
    /// # Errors
    ///
    /// Validation failures, a duplicate name, or storage errors.
    pub async fn create(&self, input: NewRaffle) -> Result<Raffle, ServiceError> {
        let name = validate_name(&input.name)?;
        validate_total(input.total_tickets)?;
        validate_price(input.ticket_price.cents())?;

        let now = self.clock.now();
        let raffle = Raffle {
            id: RaffleId::new(),
            name,
            prize_description: input.prize_description.trim().to_string(),
            total_tickets: input.total_tickets,
            ticket_price: input.ticket_price,
            draw_method: input.draw_method.trim().to_string(),
            active: input.active,
            created_at: now,
            updated_at: now,
        };

        let raffle = self.raffles.insert(raffle).await.map_err(duplicate_name)?;
        tracing::info!(raffle_id = %raffle.id, name = %raffle.name, active = raffle.active, "Raffle created");
        Ok(raffle)
    }

    /// Fetch a raffle.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if it does not exist.
    pub async fn get(&self, id: RaffleId) -> Result<Raffle, ServiceError> {
        self.raffles
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("raffle", id))
    }

    /// The raffle currently on sale, if any.
    ///
    /// # Errors
    ///
    /// Storage errors.
    pub async fn active(&self) -> Result<Option<Raffle>, ServiceError> {
        Ok(self.raffles.find_active().await?)
    }

    /// All raffles, newest first.
    ///
    /// # Errors
    ///
    /// Storage errors.
    pub async fn list(&self) -> Result<Vec<Raffle>, ServiceError> {
        Ok(self.raffles.list().await?)
    }

    /// Apply a partial update.
    ///
    /// Changing `total_tickets` on a raffle with a pool rebuilds the pool at
    /// the new size, since ticket numbers are padded to the total's width.
    /// That is refused while any ticket is reserved or sold.
    ///
    /// # Errors
    ///
    /// Not found, validation failures (including a resize with reserved or
    /// sold tickets), a duplicate name, or storage errors.
    pub async fn update(&self, id: RaffleId, changes: RaffleChanges) -> Result<Raffle, ServiceError> {
        let previous = self.get(id).await?;
        let mut raffle = previous.clone();
        let mut rebuild_pool = false;

        if let Some(name) = changes.name {
            raffle.name = validate_name(&name)?;
        }
        if let Some(prize) = changes.prize_description {
            raffle.prize_description = prize.trim().to_string();
        }
        if let Some(total) = changes.total_tickets {
            validate_total(total)?;
            if total != raffle.total_tickets {
                let summary = self.tickets.summary(id).await?;
                if summary.reserved + summary.sold > 0 {
                    return Err(ServiceError::validation(format!(
                        "total_tickets cannot change while {} tickets are reserved or sold",
                        summary.reserved + summary.sold
                    )));
                }
                rebuild_pool = summary.total > 0;
            }
            raffle.total_tickets = total;
        }
        if let Some(price) = changes.ticket_price {
            validate_price(price.cents())?;
            raffle.ticket_price = price;
        }
        if let Some(draw_method) = changes.draw_method {
            raffle.draw_method = draw_method.trim().to_string();
        }
        if let Some(active) = changes.active {
            raffle.active = active;
        }
        raffle.updated_at = self.clock.now();

        let raffle = self.raffles.update(raffle).await.map_err(|err| match err {
            StoreError::NotFound(_) => ServiceError::not_found("raffle", id),
            other => duplicate_name(other),
        })?;
        if rebuild_pool {
            self.resize_pool(&previous, &raffle).await?;
        }
        tracing::info!(raffle_id = %raffle.id, active = raffle.active, "Raffle updated");
        Ok(raffle)
    }

    /// Rebuild the pool after a total change, restoring the old total if that fails.
    async fn resize_pool(&self, previous: &Raffle, raffle: &Raffle) -> Result<(), ServiceError> {
        let pool = fresh_pool(raffle.id, raffle.total_tickets, self.clock.now());
        match self.tickets.replace_pool(raffle.id, pool).await {
            Ok(replacement) => {
                tracing::info!(
                    raffle_id = %raffle.id,
                    from = previous.total_tickets,
                    to = raffle.total_tickets,
                    deleted = replacement.deleted,
                    created = replacement.created,
                    "Ticket pool resized"
                );
                Ok(())
            }
            Err(err) => {
                tracing::error!(raffle_id = %raffle.id, error = %err, "Ticket pool resize failed; restoring total");
                let mut restored = raffle.clone();
                restored.total_tickets = previous.total_tickets;
                if let Err(restore_err) = self.raffles.update(restored).await {
                    tracing::error!(raffle_id = %raffle.id, error = %restore_err, "Could not restore raffle total");
                }
                Err(err.into())
            }
        }
    }

    /// Delete a raffle together with its tickets and promotions.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if it does not exist.
    pub async fn delete(&self, id: RaffleId) -> Result<(), ServiceError> {
        if self.raffles.delete(id).await? {
            tracing::info!(raffle_id = %id, "Raffle deleted");
            Ok(())
        } else {
            Err(ServiceError::not_found("raffle", id))
        }
    }
}

fn duplicate_name(err: StoreError) -> ServiceError {
    match err {
        StoreError::DuplicateKey(_) => {
            ServiceError::Duplicate("a raffle with this name already exists".to_string())
        }
        other => other.into(),
    }
}

fn validate_name(name: &str) -> Result<String, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("raffle name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ServiceError::validation(format!(
            "raffle name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_total(total: u32) -> Result<(), ServiceError> {
    if total == 0 || total > MAX_TOTAL_TICKETS {
        return Err(ServiceError::validation(format!(
            "total_tickets must be between 1 and {MAX_TOTAL_TICKETS}"
        )));
    }
    Ok(())
}

fn validate_price(cents: u64) -> Result<(), ServiceError> {
    if cents == 0 {
        return Err(ServiceError::validation("ticket_price must be greater than zero"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(validate_name("  Moto  ").unwrap(), "Moto");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn total_is_bounded() {
        assert!(validate_total(0).is_err());
        assert!(validate_total(1).is_ok());
        assert!(validate_total(MAX_TOTAL_TICKETS).is_ok());
        assert!(validate_total(MAX_TOTAL_TICKETS + 1).is_err());
    }

    #[test]
    fn duplicate_key_maps_to_duplicate() {
        let err = duplicate_name(StoreError::DuplicateKey("raffles_name_key".to_string()));
        assert!(matches!(err, ServiceError::Duplicate(_)));
        let err = duplicate_name(StoreError::Database("down".to_string()));
        assert!(matches!(err, ServiceError::Store(_)));
    }
}
