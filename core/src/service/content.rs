//! Site content blocks and the public site aggregate.

use crate::content::{ContentBlock, ContentKey, SiteSettings};
use crate::environment::Clock;
use crate::error::ServiceError;
use crate::store::{ContentStore, PromotionStore, RaffleStore, Stores, TicketStore};
use crate::types::{Promotion, Raffle, StatusSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything the public landing page needs in one response.
///
/// Missing pieces are `None` rather than errors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteContent {
    /// The raffle on sale
    pub raffle: Option<Raffle>,
    /// Its bundles
    pub promotions: Vec<Promotion>,
    /// Its ticket counts
    pub summary: Option<StatusSummary>,
    /// Hero banner block
    pub hero: Option<serde_json::Value>,
    /// Prize carousel block
    pub prize_carousel: Option<serde_json::Value>,
    /// Info ticker block
    pub info_ticker: Option<serde_json::Value>,
    /// Settings block
    pub settings: Option<serde_json::Value>,
}

/// Read and replace content blocks.
#[derive(Clone)]
pub struct ContentService {
    content: Arc<dyn ContentStore>,
    raffles: Arc<dyn RaffleStore>,
    tickets: Arc<dyn TicketStore>,
    promotions: Arc<dyn PromotionStore>,
    clock: Arc<dyn Clock>,
}

impl ContentService {
    /// Build from the shared stores.
    #[must_use]
    pub fn new(stores: &Stores, clock: Arc<dyn Clock>) -> Self {
        Self {
            content: stores.content.clone(),
            raffles: stores.raffles.clone(),
            tickets: stores.tickets.clone(),
            promotions: stores.promotions.clone(),
            clock,
        }
    }

    /// Replace a block.
    ///
    /// The body must be a JSON object; the settings block must also match
    /// [`SiteSettings`].
    ///
    /// # Errors
    ///
    /// Validation failures or storage errors.
    pub async fn put(&self, key: ContentKey, body: serde_json::Value) -> Result<ContentBlock, ServiceError> {
        if !body.is_object() {
            return Err(ServiceError::validation("content body must be a JSON object"));
        }
        if key == ContentKey::Settings {
            serde_json::from_value::<SiteSettings>(body.clone())
                .map_err(|e| ServiceError::validation(format!("invalid settings: {e}")))?;
        }

        let block = self
            .content
            .put(ContentBlock {
                key,
                body,
                updated_at: self.clock.now(),
            })
            .await?;
        tracing::info!(key = %key, "Content block replaced");
        Ok(block)
    }

    /// Fetch a single block.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if it was never set.
    pub async fn get(&self, key: ContentKey) -> Result<ContentBlock, ServiceError> {
        self.content
            .get(key)
            .await?
            .ok_or_else(|| ServiceError::not_found("content block", key))
    }

    /// The public landing page aggregate.
    ///
    /// Failures reading individual pieces are logged and reported as absent.
    pub async fn site(&self) -> SiteContent {
        let mut site = SiteContent::default();

        match self.raffles.find_active().await {
            Ok(Some(raffle)) => {
                match self.promotions.list_for_raffle(raffle.id).await {
                    Ok(promotions) => site.promotions = promotions,
                    Err(e) => tracing::warn!(raffle_id = %raffle.id, error = %e, "Failed to load promotions for site"),
                }
                match self.tickets.summary(raffle.id).await {
                    Ok(summary) => site.summary = Some(summary),
                    Err(e) => tracing::warn!(raffle_id = %raffle.id, error = %e, "Failed to load ticket summary for site"),
                }
                site.raffle = Some(raffle);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to load active raffle for site"),
        }

        for key in ContentKey::ALL {
            let body = match self.content.get(key).await {
                Ok(block) => block.map(|b| b.body),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to load content block");
                    None
                }
            };
            match key {
                ContentKey::Hero => site.hero = body,
                ContentKey::PrizeCarousel => site.prize_carousel = body,
                ContentKey::InfoTicker => site.info_ticker = body,
                ContentKey::Settings => site.settings = body,
            }
        }

        site
    }
}

/// Typed settings, or `None` if unset or unreadable.
pub(crate) async fn load_settings(content: &dyn ContentStore) -> Option<SiteSettings> {
    match content.get(ContentKey::Settings).await {
        Ok(Some(block)) => match serde_json::from_value(block.body) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(error = %e, "Stored settings block does not match the expected shape");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load settings block");
            None
        }
    }
}
