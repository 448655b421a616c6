//! Row types and their conversion into domain records.

use chrono::{DateTime, Utc};
use rifa_core::content::{ContentBlock, ContentKey};
use rifa_core::{
    Money, Promotion, PromotionId, Raffle, RaffleId, Role, StoreError, Ticket, TicketNumber,
    TicketStatus, User, UserId,
};
use uuid::Uuid;

pub(crate) const RAFFLE_COLUMNS: &str = "id, name, prize_description, total_tickets, \
     ticket_price_cents, draw_method, active, created_at, updated_at";

pub(crate) const TICKET_COLUMNS: &str = "raffle_id, number, status, buyer_name, buyer_email, \
     buyer_phone, transaction_id, notes, reserved_at, sold_at, updated_at";

pub(crate) const PROMOTION_COLUMNS: &str =
    "id, raffle_id, quantity, price_cents, description, created_at";

pub(crate) const USER_COLUMNS: &str =
    "id, username, password_hash, role, active, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct RaffleRow {
    id: Uuid,
    name: String,
    prize_description: String,
    total_tickets: i32,
    ticket_price_cents: i64,
    draw_method: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RaffleRow> for Raffle {
    type Error = StoreError;

    fn try_from(row: RaffleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RaffleId::from_uuid(row.id),
            name: row.name,
            prize_description: row.prize_description,
            total_tickets: to_u32(row.total_tickets, "total_tickets")?,
            ticket_price: Money::from_cents(to_u64(row.ticket_price_cents, "ticket_price_cents")?),
            draw_method: row.draw_method,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct TicketRow {
    raffle_id: Uuid,
    number: String,
    status: String,
    buyer_name: Option<String>,
    buyer_email: Option<String>,
    buyer_phone: Option<String>,
    transaction_id: Option<String>,
    notes: Option<String>,
    reserved_at: Option<DateTime<Utc>>,
    sold_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Self {
            raffle_id: RaffleId::from_uuid(row.raffle_id),
            number: TicketNumber::from_normalized(row.number),
            status: parse_status(&row.status)?,
            buyer_name: row.buyer_name,
            buyer_email: row.buyer_email,
            buyer_phone: row.buyer_phone,
            transaction_id: row.transaction_id,
            notes: row.notes,
            reserved_at: row.reserved_at,
            sold_at: row.sold_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PromotionRow {
    id: Uuid,
    raffle_id: Uuid,
    quantity: i32,
    price_cents: i64,
    description: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PromotionRow> for Promotion {
    type Error = StoreError;

    fn try_from(row: PromotionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PromotionId::from_uuid(row.id),
            raffle_id: RaffleId::from_uuid(row.raffle_id),
            quantity: to_u32(row.quantity, "quantity")?,
            price: Money::from_cents(to_u64(row.price_cents, "price_cents")?),
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    role: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| StoreError::Serialization(format!("{e}")))?;
        Ok(Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            password_hash: row.password_hash,
            role,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ContentRow {
    key: String,
    body: serde_json::Value,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContentRow> for ContentBlock {
    type Error = StoreError;

    fn try_from(row: ContentRow) -> Result<Self, Self::Error> {
        let key: ContentKey = row
            .key
            .parse()
            .map_err(|e| StoreError::Serialization(format!("{e}")))?;
        Ok(Self {
            key,
            body: row.body,
            updated_at: row.updated_at,
        })
    }
}

/// Convert every row, failing on the first bad one.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

pub(crate) fn parse_status(value: &str) -> Result<TicketStatus, StoreError> {
    value
        .parse()
        .map_err(|e| StoreError::Serialization(format!("{e}")))
}

pub(crate) fn to_u32(value: i32, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Serialization(format!("negative {column}: {value}")))
}

pub(crate) fn to_u64(value: i64, column: &str) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Serialization(format!("negative {column}: {value}")))
}

pub(crate) fn to_i64(value: u64, column: &str) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Serialization(format!("{column} out of range: {value}")))
}

pub(crate) fn to_i32(value: u32, column: &str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Serialization(format!("{column} out of range: {value}")))
}
