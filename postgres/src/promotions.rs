//! Promotion persistence.

use crate::rows::{PROMOTION_COLUMNS, PromotionRow, convert_all, to_i32, to_i64};
use crate::{PostgresStore, db_error};
use rifa_core::store::{PromotionStore, StoreFuture};
use rifa_core::{Promotion, PromotionId, RaffleId, StoreError};

impl PromotionStore for PostgresStore {
    fn insert(&self, promotion: Promotion) -> StoreFuture<'_, Promotion> {
        Box::pin(async move {
            let row: PromotionRow = sqlx::query_as(&format!(
                "INSERT INTO promotions ({PROMOTION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING {PROMOTION_COLUMNS}"
            ))
            .bind(promotion.id.as_uuid())
            .bind(promotion.raffle_id.as_uuid())
            .bind(to_i32(promotion.quantity, "quantity")?)
            .bind(to_i64(promotion.price.cents(), "price")?)
            .bind(&promotion.description)
            .bind(promotion.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
            row.try_into()
        })
    }

    fn get(&self, id: PromotionId) -> StoreFuture<'_, Option<Promotion>> {
        Box::pin(async move {
            let row: Option<PromotionRow> =
                sqlx::query_as(&format!("SELECT {PROMOTION_COLUMNS} FROM promotions WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_error)?;
            row.map(Promotion::try_from).transpose()
        })
    }

    fn list_for_raffle(&self, raffle_id: RaffleId) -> StoreFuture<'_, Vec<Promotion>> {
        Box::pin(async move {
            let rows: Vec<PromotionRow> = sqlx::query_as(&format!(
                "SELECT {PROMOTION_COLUMNS} FROM promotions WHERE raffle_id = $1 \
                 ORDER BY quantity, created_at"
            ))
            .bind(raffle_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
            convert_all(rows)
        })
    }

    fn update(&self, promotion: Promotion) -> StoreFuture<'_, Promotion> {
        Box::pin(async move {
            let row: Option<PromotionRow> = sqlx::query_as(&format!(
                "UPDATE promotions SET quantity = $2, price_cents = $3, description = $4 \
                 WHERE id = $1 RETURNING {PROMOTION_COLUMNS}"
            ))
            .bind(promotion.id.as_uuid())
            .bind(to_i32(promotion.quantity, "quantity")?)
            .bind(to_i64(promotion.price.cents(), "price")?)
            .bind(&promotion.description)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
            row.ok_or_else(|| StoreError::NotFound(format!("promotion {}", promotion.id)))?
                .try_into()
        })
    }

    fn delete(&self, id: PromotionId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM promotions WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(result.rows_affected() > 0)
        })
    }
}
