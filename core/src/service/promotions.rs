//! Promotion bundles and price quotes.

use crate::environment::Clock;
use crate::error::ServiceError;
use crate::pricing::{self, Quote};
use crate::store::{PromotionStore, RaffleStore, StoreError, Stores};
use crate::types::{NewPromotion, Promotion, PromotionChanges, PromotionId, Raffle, RaffleId};
use std::sync::Arc;

/// Manage a raffle's bundles and quote prices with them.
#[derive(Clone)]
pub struct PromotionService {
    raffles: Arc<dyn RaffleStore>,
    promotions: Arc<dyn PromotionStore>,
    clock: Arc<dyn Clock>,
}

impl PromotionService {
    /// Build from the shared stores.
    #[must_use]
    pub fn new(stores: &Stores, clock: Arc<dyn Clock>) -> Self {
        Self {
            raffles: stores.raffles.clone(),
            promotions: stores.promotions.clone(),
            clock,
        }
    }

    /// Add a bundle to a raffle.
    ///
    /// # Errors
    ///
    /// Raffle not found, quantity below 2, zero price, or storage errors.
    pub async fn create(&self, raffle_id: RaffleId, input: NewPromotion) -> Result<Promotion, ServiceError> {
        let raffle = self.raffle(raffle_id).await?;
        validate(input.quantity, input.price.cents())?;

        let promotion = Promotion {
            id: PromotionId::new(),
            raffle_id: raffle.id,
            quantity: input.quantity,
            price: input.price,
            description: input.description.trim().to_string(),
            created_at: self.clock.now(),
        };
        let promotion = self.promotions.insert(promotion).await.map_err(|err| match err {
            StoreError::NotFound(_) => ServiceError::not_found("raffle", raffle_id),
            other => other.into(),
        })?;

        tracing::info!(promotion_id = %promotion.id, raffle_id = %raffle.id, quantity = promotion.quantity, "Promotion created");
        Ok(promotion)
    }

    /// Bundles of a raffle ordered by quantity.
    ///
    /// # Errors
    ///
    /// Raffle not found or storage errors.
    pub async fn list(&self, raffle_id: RaffleId) -> Result<Vec<Promotion>, ServiceError> {
        let raffle = self.raffle(raffle_id).await?;
        Ok(self.promotions.list_for_raffle(raffle.id).await?)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Not found, validation failures, or storage errors.
    pub async fn update(&self, id: PromotionId, changes: PromotionChanges) -> Result<Promotion, ServiceError> {
        let mut promotion = self
            .promotions
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("promotion", id))?;

        if let Some(quantity) = changes.quantity {
            promotion.quantity = quantity;
        }
        if let Some(price) = changes.price {
            promotion.price = price;
        }
        if let Some(description) = changes.description {
            promotion.description = description.trim().to_string();
        }
        validate(promotion.quantity, promotion.price.cents())?;

        let promotion = self.promotions.update(promotion).await.map_err(|err| match err {
            StoreError::NotFound(_) => ServiceError::not_found("promotion", id),
            other => other.into(),
        })?;
        tracing::info!(promotion_id = %promotion.id, "Promotion updated");
        Ok(promotion)
    }

    /// Remove a bundle.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if it does not exist.
    pub async fn delete(&self, id: PromotionId) -> Result<(), ServiceError> {
        if self.promotions.delete(id).await? {
            tracing::info!(promotion_id = %id, "Promotion deleted");
            Ok(())
        } else {
            Err(ServiceError::not_found("promotion", id))
        }
    }

    /// Cheapest price for `quantity` tickets of a raffle.
    ///
    /// # Errors
    ///
    /// Raffle not found, a quantity outside `1..=total_tickets`, or storage errors.
    pub async fn quote(&self, raffle_id: RaffleId, quantity: u32) -> Result<Quote, ServiceError> {
        let raffle = self.raffle(raffle_id).await?;
        if quantity == 0 || quantity > raffle.total_tickets {
            return Err(ServiceError::validation(format!(
                "quantity must be between 1 and {}",
                raffle.total_tickets
            )));
        }
        let promotions = self.promotions.list_for_raffle(raffle.id).await?;
        Ok(pricing::quote(quantity, raffle.ticket_price, &promotions))
    }

    async fn raffle(&self, raffle_id: RaffleId) -> Result<Raffle, ServiceError> {
        self.raffles
            .get(raffle_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("raffle", raffle_id))
    }
}

fn validate(quantity: u32, price_cents: u64) -> Result<(), ServiceError> {
    if quantity < 2 {
        return Err(ServiceError::validation("promotion quantity must be at least 2"));
    }
    if price_cents == 0 {
        return Err(ServiceError::validation("promotion price must be greater than zero"));
    }
    Ok(())
}
