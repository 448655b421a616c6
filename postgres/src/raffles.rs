//! Raffle persistence.

use crate::rows::{RAFFLE_COLUMNS, RaffleRow, convert_all, to_i32, to_i64};
use crate::{PostgresStore, db_error};
use rifa_core::store::{RaffleStore, StoreFuture};
use rifa_core::{Raffle, RaffleId, StoreError};
use sqlx::{Postgres, Transaction};

/// Clear the active flag on every raffle but `keep`.
async fn deactivate_others(tx: &mut Transaction<'_, Postgres>, keep: RaffleId) -> Result<(), StoreError> {
    sqlx::query("UPDATE raffles SET active = FALSE WHERE active AND id <> $1")
        .bind(keep.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;
    Ok(())
}

impl RaffleStore for PostgresStore {
    fn insert(&self, raffle: Raffle) -> StoreFuture<'_, Raffle> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(db_error)?;
            if raffle.active {
                deactivate_others(&mut tx, raffle.id).await?;
            }

            let row: RaffleRow = sqlx::query_as(&format!(
                "INSERT INTO raffles ({RAFFLE_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 RETURNING {RAFFLE_COLUMNS}"
            ))
            .bind(raffle.id.as_uuid())
            .bind(&raffle.name)
            .bind(&raffle.prize_description)
            .bind(to_i32(raffle.total_tickets, "total_tickets")?)
            .bind(to_i64(raffle.ticket_price.cents(), "ticket_price")?)
            .bind(&raffle.draw_method)
            .bind(raffle.active)
            .bind(raffle.created_at)
            .bind(raffle.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;

            tx.commit().await.map_err(db_error)?;
            row.try_into()
        })
    }

    fn get(&self, id: RaffleId) -> StoreFuture<'_, Option<Raffle>> {
        Box::pin(async move {
            let row: Option<RaffleRow> =
                sqlx::query_as(&format!("SELECT {RAFFLE_COLUMNS} FROM raffles WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_error)?;
            row.map(Raffle::try_from).transpose()
        })
    }

    fn find_active(&self) -> StoreFuture<'_, Option<Raffle>> {
        Box::pin(async move {
            let row: Option<RaffleRow> =
                sqlx::query_as(&format!("SELECT {RAFFLE_COLUMNS} FROM raffles WHERE active"))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_error)?;
            row.map(Raffle::try_from).transpose()
        })
    }

    fn list(&self) -> StoreFuture<'_, Vec<Raffle>> {
        Box::pin(async move {
            let rows: Vec<RaffleRow> = sqlx::query_as(&format!(
                "SELECT {RAFFLE_COLUMNS} FROM raffles ORDER BY created_at DESC, name"
            ))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
            convert_all(rows)
        })
    }

    fn update(&self, raffle: Raffle) -> StoreFuture<'_, Raffle> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(db_error)?;
            if raffle.active {
                deactivate_others(&mut tx, raffle.id).await?;
            }

            let row: Option<RaffleRow> = sqlx::query_as(&format!(
                "UPDATE raffles SET name = $2, prize_description = $3, total_tickets = $4, \
                 ticket_price_cents = $5, draw_method = $6, active = $7, updated_at = $8 \
                 WHERE id = $1 \
                 RETURNING {RAFFLE_COLUMNS}"
            ))
            .bind(raffle.id.as_uuid())
            .bind(&raffle.name)
            .bind(&raffle.prize_description)
            .bind(to_i32(raffle.total_tickets, "total_tickets")?)
            .bind(to_i64(raffle.ticket_price.cents(), "ticket_price")?)
            .bind(&raffle.draw_method)
            .bind(raffle.active)
            .bind(raffle.updated_at)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;

            let Some(row) = row else {
                return Err(StoreError::NotFound(format!("raffle {}", raffle.id)));
            };
            tx.commit().await.map_err(db_error)?;
            row.try_into()
        })
    }

    fn delete(&self, id: RaffleId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            // Tickets and promotions go with it through ON DELETE CASCADE.
            let result = sqlx::query("DELETE FROM raffles WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(result.rows_affected() > 0)
        })
    }
}
