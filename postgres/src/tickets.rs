//! Ticket pools and conditional multi-ticket updates.

use crate::rows::{TICKET_COLUMNS, TicketRow, convert_all, parse_status, to_u64};
use crate::{PostgresStore, db_error};
use chrono::{DateTime, Utc};
use rifa_core::store::{PoolReplacement, StoreFuture, TicketStore};
use rifa_core::ticket::{BuyerUpdate, StatusGuard, TicketChange};
use rifa_core::{Page, RaffleId, StatusSummary, Ticket, TicketNumber, TicketQuery};

/// Mirrors `Ticket::apply`: buyer columns are overwritten only when the
/// change sets or clears them, and timestamps follow the target status.
const APPLY_CHANGE: &str = "\
    UPDATE tickets SET \
        status = $3, \
        buyer_name = CASE WHEN $4 THEN $5 ELSE buyer_name END, \
        buyer_email = CASE WHEN $4 THEN $6 ELSE buyer_email END, \
        buyer_phone = CASE WHEN $4 THEN $7 ELSE buyer_phone END, \
        transaction_id = CASE WHEN $4 THEN $8 ELSE transaction_id END, \
        notes = COALESCE($9, notes), \
        reserved_at = CASE $3 WHEN 'available' THEN NULL WHEN 'reserved' THEN $10 ELSE reserved_at END, \
        sold_at = CASE $3 WHEN 'sold' THEN $10 ELSE NULL END, \
        updated_at = $10 \
    WHERE raffle_id = $1 \
      AND number = ANY($2) \
      AND ($11::text IS NULL OR status = $11) \
      AND ($12::text IS NULL OR status <> $12)";

/// Row locks in number order, so overlapping batches queue instead of deadlocking.
const LOCK_TICKETS: &str = "\
    SELECT number FROM tickets \
    WHERE raffle_id = $1 AND number = ANY($2) \
    ORDER BY number \
    FOR UPDATE";

fn numbers_param(numbers: &[TicketNumber]) -> Vec<String> {
    numbers.iter().map(|n| n.as_str().to_string()).collect()
}

/// `(status = ?, status <> ?)` bind values for a guard.
const fn guard_params(guard: StatusGuard) -> (Option<&'static str>, Option<&'static str>) {
    match guard {
        StatusGuard::Is(status) => (Some(status.as_str()), None),
        StatusGuard::IsNot(status) => (None, Some(status.as_str())),
        StatusGuard::Any => (None, None),
    }
}

impl TicketStore for PostgresStore {
    fn replace_pool(&self, raffle_id: RaffleId, tickets: Vec<Ticket>) -> StoreFuture<'_, PoolReplacement> {
        Box::pin(async move {
            // Pools are always fresh: buyer columns start NULL.
            let mut numbers = Vec::with_capacity(tickets.len());
            let mut statuses = Vec::with_capacity(tickets.len());
            let mut updated = Vec::with_capacity(tickets.len());
            for ticket in &tickets {
                numbers.push(ticket.number.as_str().to_string());
                statuses.push(ticket.status.as_str().to_string());
                updated.push(ticket.updated_at);
            }

            let mut tx = self.pool.begin().await.map_err(db_error)?;

            let deleted = sqlx::query("DELETE FROM tickets WHERE raffle_id = $1")
                .bind(raffle_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?
                .rows_affected();

            let created = sqlx::query(
                "INSERT INTO tickets (raffle_id, number, status, updated_at) \
                 SELECT $1, t.number, t.status, t.updated_at \
                 FROM UNNEST($2::text[], $3::text[], $4::timestamptz[]) AS t(number, status, updated_at)",
            )
            .bind(raffle_id.as_uuid())
            .bind(&numbers)
            .bind(&statuses)
            .bind(&updated)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?
            .rows_affected();

            tx.commit().await.map_err(db_error)?;
            Ok(PoolReplacement { deleted, created })
        })
    }

    fn find<'a>(&'a self, raffle_id: RaffleId, numbers: &'a [TicketNumber]) -> StoreFuture<'a, Vec<Ticket>> {
        Box::pin(async move {
            let rows: Vec<TicketRow> = sqlx::query_as(&format!(
                "SELECT {TICKET_COLUMNS} FROM tickets \
                 WHERE raffle_id = $1 AND number = ANY($2) ORDER BY number"
            ))
            .bind(raffle_id.as_uuid())
            .bind(numbers_param(numbers))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
            convert_all(rows)
        })
    }

    fn get<'a>(&'a self, raffle_id: RaffleId, number: &'a TicketNumber) -> StoreFuture<'a, Option<Ticket>> {
        Box::pin(async move {
            let row: Option<TicketRow> = sqlx::query_as(&format!(
                "SELECT {TICKET_COLUMNS} FROM tickets WHERE raffle_id = $1 AND number = $2"
            ))
            .bind(raffle_id.as_uuid())
            .bind(number.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
            row.map(Ticket::try_from).transpose()
        })
    }

    fn list(&self, raffle_id: RaffleId, query: TicketQuery) -> StoreFuture<'_, Page<Ticket>> {
        Box::pin(async move {
            let status = query.status.map(|s| s.as_str());

            let total: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM tickets WHERE raffle_id = $1 AND ($2::text IS NULL OR status = $2)",
            )
            .bind(raffle_id.as_uuid())
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

            let rows: Vec<TicketRow> = sqlx::query_as(&format!(
                "SELECT {TICKET_COLUMNS} FROM tickets \
                 WHERE raffle_id = $1 AND ($2::text IS NULL OR status = $2) \
                 ORDER BY number LIMIT $3 OFFSET $4"
            ))
            .bind(raffle_id.as_uuid())
            .bind(status)
            .bind(i64::from(query.page_size))
            .bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

            Ok(Page {
                items: convert_all(rows)?,
                page: query.page,
                page_size: query.page_size,
                total: to_u64(total, "count")?,
            })
        })
    }

    fn available_numbers(&self, raffle_id: RaffleId) -> StoreFuture<'_, Vec<TicketNumber>> {
        Box::pin(async move {
            let numbers: Vec<String> = sqlx::query_scalar(
                "SELECT number FROM tickets WHERE raffle_id = $1 AND status = 'available' ORDER BY number",
            )
            .bind(raffle_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
            Ok(numbers.into_iter().map(TicketNumber::from_normalized).collect())
        })
    }

    fn apply_all<'a>(
        &'a self,
        raffle_id: RaffleId,
        numbers: &'a [TicketNumber],
        change: &'a TicketChange,
        now: DateTime<Utc>,
    ) -> StoreFuture<'a, u64> {
        Box::pin(async move {
            let expected = numbers.len() as u64;
            let (overwrite_buyer, buyer) = match &change.buyer {
                BuyerUpdate::Keep => (false, None),
                BuyerUpdate::Set(buyer) => (true, Some(buyer)),
                BuyerUpdate::Clear => (true, None),
            };
            let (status_is, status_is_not) = guard_params(change.guard);

            let numbers = numbers_param(numbers);
            let mut tx = self.pool.begin().await.map_err(db_error)?;
            sqlx::query(LOCK_TICKETS)
                .bind(raffle_id.as_uuid())
                .bind(&numbers)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

            let updated = sqlx::query(APPLY_CHANGE)
                .bind(raffle_id.as_uuid())
                .bind(&numbers)
                .bind(change.status.as_str())
                .bind(overwrite_buyer)
                .bind(buyer.map(|b| b.name.as_str()))
                .bind(buyer.and_then(|b| b.email.as_deref()))
                .bind(buyer.and_then(|b| b.phone.as_deref()))
                .bind(buyer.and_then(|b| b.transaction_id.as_deref()))
                .bind(change.notes.as_deref())
                .bind(now)
                .bind(status_is)
                .bind(status_is_not)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?
                .rows_affected();

            if updated != expected {
                tx.rollback().await.map_err(db_error)?;
                tracing::debug!(%raffle_id, expected, updated, "Conditional ticket update rolled back");
                return Ok(0);
            }
            tx.commit().await.map_err(db_error)?;
            Ok(updated)
        })
    }

    fn summary(&self, raffle_id: RaffleId) -> StoreFuture<'_, StatusSummary> {
        Box::pin(async move {
            let rows: Vec<(String, i64)> = sqlx::query_as(
                "SELECT status, COUNT(*) FROM tickets WHERE raffle_id = $1 GROUP BY status",
            )
            .bind(raffle_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

            let mut summary = StatusSummary::default();
            for (status, count) in rows {
                let count = to_u64(count, "count")?;
                match parse_status(&status)? {
                    rifa_core::TicketStatus::Available => summary.available = count,
                    rifa_core::TicketStatus::Reserved => summary.reserved = count,
                    rifa_core::TicketStatus::Sold => summary.sold = count,
                }
                summary.total += count;
            }
            Ok(summary)
        })
    }
}
