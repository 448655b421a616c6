//! Domain types for the raffle backend.
//!
//! Value objects (identifiers, money, ticket numbers) and the entities the
//! stores persist. Entities are plain data; the rules that change them live
//! in [`crate::ticket`] and the services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a raffle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaffleId(Uuid);

impl RaffleId {
    /// Creates a new random `RaffleId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `RaffleId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RaffleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RaffleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a promotion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromotionId(Uuid);

impl PromotionId {
    /// Creates a new random `PromotionId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PromotionId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PromotionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PromotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user account
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Adds two money amounts, clamping at `u64::MAX` cents
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtracts two money amounts, clamping at zero
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Multiplies money by a quantity, clamping at `u64::MAX` cents
    #[must_use]
    pub const fn saturating_multiply(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// A ticket number: a zero-padded decimal string such as `"007"`.
///
/// Use [`TicketNumber::normalize`] to turn user input into the padded form
/// for a given pool size.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketNumber(String);

impl TicketNumber {
    /// Wraps an already-normalized number.
    #[must_use]
    pub const fn from_normalized(number: String) -> Self {
        Self(number)
    }

    /// Borrow the number as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketNumber {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Where a ticket is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Free to reserve or sell
    Available,
    /// Held for a buyer pending payment
    Reserved,
    /// Paid for and attributed to a buyer
    Sold,
}

impl TicketStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [Self; 3] = [Self::Available, Self::Reserved, Self::Sold];

    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Sold => "sold",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status or role string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    /// Error for an unrecognized `value` of the named `kind`
    #[must_use]
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl FromStr for TicketStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "reserved" => Ok(Self::Reserved),
            "sold" => Ok(Self::Sold),
            other => Err(ParseEnumError::new("ticket status", other)),
        }
    }
}

/// Buyer details attached to a sold ticket.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerInfo {
    /// Buyer's full name (required for a sale)
    pub name: String,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Payment reference supplied by the seller
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// One numbered entry in a raffle's pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Owning raffle
    pub raffle_id: RaffleId,
    /// Zero-padded number, unique within the raffle
    pub number: TicketNumber,
    /// Current lifecycle status
    pub status: TicketStatus,
    /// Buyer name
    pub buyer_name: Option<String>,
    /// Buyer email
    pub buyer_email: Option<String>,
    /// Buyer phone
    pub buyer_phone: Option<String>,
    /// Payment reference
    pub transaction_id: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the ticket was last reserved
    pub reserved_at: Option<DateTime<Utc>>,
    /// When the ticket was sold
    pub sold_at: Option<DateTime<Utc>>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// A fresh, available ticket.
    #[must_use]
    pub const fn available(raffle_id: RaffleId, number: TicketNumber, now: DateTime<Utc>) -> Self {
        Self {
            raffle_id,
            number,
            status: TicketStatus::Available,
            buyer_name: None,
            buyer_email: None,
            buyer_phone: None,
            transaction_id: None,
            notes: None,
            reserved_at: None,
            sold_at: None,
            updated_at: now,
        }
    }

    /// True if any buyer field is set
    #[must_use]
    pub const fn has_buyer(&self) -> bool {
        self.buyer_name.is_some()
            || self.buyer_email.is_some()
            || self.buyer_phone.is_some()
            || self.transaction_id.is_some()
    }
}

/// Ticket counts per status for one raffle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    /// Tickets still available
    pub available: u64,
    /// Tickets reserved
    pub reserved: u64,
    /// Tickets sold
    pub sold: u64,
    /// All tickets in the pool
    pub total: u64,
}

impl StatusSummary {
    /// Count one more ticket in `status`
    pub const fn record(&mut self, status: TicketStatus) {
        match status {
            TicketStatus::Available => self.available += 1,
            TicketStatus::Reserved => self.reserved += 1,
            TicketStatus::Sold => self.sold += 1,
        }
        self.total += 1;
    }
}

/// Filter and page selection for ticket listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TicketQuery {
    /// Only tickets with this status
    pub status: Option<TicketStatus>,
    /// Zero-based page index
    pub page: u32,
    /// Tickets per page
    pub page_size: u32,
}

impl TicketQuery {
    /// Default page size
    pub const DEFAULT_PAGE_SIZE: u32 = 100;
    /// Largest page a caller may request
    pub const MAX_PAGE_SIZE: u32 = 1000;

    /// Rows to skip
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page as u64 * self.page_size as u64
    }
}

impl Default for TicketQuery {
    fn default() -> Self {
        Self {
            status: None,
            page: 0,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Zero-based page index
    pub page: u32,
    /// Requested page size
    pub page_size: u32,
    /// Total matching items across all pages
    pub total: u64,
}

// ============================================================================
// Raffles
// ============================================================================

/// A sales campaign with a fixed ticket pool and a single prize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Raffle {
    /// Identifier
    pub id: RaffleId,
    /// Unique display name
    pub name: String,
    /// What the winner gets
    pub prize_description: String,
    /// Pool size
    pub total_tickets: u32,
    /// Price of a single ticket
    pub ticket_price: Money,
    /// How the winner is drawn
    pub draw_method: String,
    /// Whether this is the raffle currently on sale
    pub active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a raffle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRaffle {
    /// Display name
    pub name: String,
    /// Prize description
    #[serde(default)]
    pub prize_description: String,
    /// Pool size
    pub total_tickets: u32,
    /// Price of a single ticket
    pub ticket_price: Money,
    /// How the winner is drawn
    #[serde(default)]
    pub draw_method: String,
    /// Activate on creation
    #[serde(default)]
    pub active: bool,
}

/// Partial update for a raffle. `None` leaves the field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaffleChanges {
    /// New name
    pub name: Option<String>,
    /// New prize description
    pub prize_description: Option<String>,
    /// New pool size (takes effect on the next initialization)
    pub total_tickets: Option<u32>,
    /// New ticket price
    pub ticket_price: Option<Money>,
    /// New draw method
    pub draw_method: Option<String>,
    /// Activate or deactivate
    pub active: Option<bool>,
}

// ============================================================================
// Promotions
// ============================================================================

/// A bundle price for buying a threshold quantity of tickets in one raffle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    /// Identifier
    pub id: PromotionId,
    /// Owning raffle
    pub raffle_id: RaffleId,
    /// Tickets in the bundle
    pub quantity: u32,
    /// Price of the whole bundle
    pub price: Money,
    /// Marketing copy
    pub description: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Input for creating a promotion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPromotion {
    /// Tickets in the bundle
    pub quantity: u32,
    /// Price of the whole bundle
    pub price: Money,
    /// Marketing copy
    #[serde(default)]
    pub description: String,
}

/// Partial update for a promotion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionChanges {
    /// New bundle size
    pub quantity: Option<u32>,
    /// New bundle price
    pub price: Option<Money>,
    /// New description
    pub description: Option<String>,
}

// ============================================================================
// Users
// ============================================================================

/// Account role. Capabilities per role are defined by the auth policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access
    Admin,
    /// Can sell tickets and view the dashboard
    Seller,
    /// Registered visitor
    User,
}

impl Role {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Seller => "seller",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "seller" => Ok(Self::Seller),
            "user" => Ok(Self::User),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}

/// A user account. The password hash is never serialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier
    pub id: UserId,
    /// Unique login name
    pub username: String,
    /// Argon2 PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Role
    pub role: Role,
    /// Inactive users cannot log in
    pub active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}
