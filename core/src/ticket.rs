//! Ticket state machine and pool numbering.
//!
//! A [`TicketChange`] describes one transition: the guard the current status
//! must satisfy, the target status, and what happens to buyer fields and
//! notes. Stores evaluate the guard and apply the change to a whole batch at
//! once; [`Ticket::apply`] is the reference semantics every store follows.

use crate::types::{BuyerInfo, RaffleId, Ticket, TicketNumber, TicketStatus};
use chrono::{DateTime, Utc};

/// Precondition on a ticket's current status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusGuard {
    /// Status must equal the given one
    Is(TicketStatus),
    /// Status must differ from the given one
    IsNot(TicketStatus),
    /// No precondition
    Any,
}

impl StatusGuard {
    /// Whether `status` satisfies the guard
    #[must_use]
    pub fn matches(self, status: TicketStatus) -> bool {
        match self {
            Self::Is(expected) => status == expected,
            Self::IsNot(excluded) => status != excluded,
            Self::Any => true,
        }
    }
}

/// What a change does to the buyer fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuyerUpdate {
    /// Leave buyer fields untouched
    Keep,
    /// Overwrite all buyer fields
    Set(BuyerInfo),
    /// Clear all buyer fields
    Clear,
}

/// One guarded ticket transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketChange {
    /// Precondition every targeted ticket must meet
    pub guard: StatusGuard,
    /// Status after the change
    pub status: TicketStatus,
    /// Buyer field handling
    pub buyer: BuyerUpdate,
    /// Replacement notes; `None` keeps existing notes
    pub notes: Option<String>,
}

impl TicketChange {
    /// available → reserved
    #[must_use]
    pub const fn reserve() -> Self {
        Self {
            guard: StatusGuard::Is(TicketStatus::Available),
            status: TicketStatus::Reserved,
            buyer: BuyerUpdate::Keep,
            notes: None,
        }
    }

    /// available/reserved → sold, attaching the buyer
    #[must_use]
    pub const fn sell(buyer: BuyerInfo) -> Self {
        Self {
            guard: StatusGuard::IsNot(TicketStatus::Sold),
            status: TicketStatus::Sold,
            buyer: BuyerUpdate::Set(buyer),
            notes: None,
        }
    }

    /// Administrative override to any status.
    ///
    /// Moving to available always clears the buyer.
    #[must_use]
    pub fn set_status(status: TicketStatus, notes: Option<String>) -> Self {
        let buyer = if status == TicketStatus::Available {
            BuyerUpdate::Clear
        } else {
            BuyerUpdate::Keep
        };
        Self {
            guard: StatusGuard::Any,
            status,
            buyer,
            notes,
        }
    }

    /// any → available, clearing the buyer
    #[must_use]
    pub fn reset() -> Self {
        Self::set_status(TicketStatus::Available, None)
    }
}

impl Ticket {
    /// Apply `change` unconditionally. Callers check the guard first.
    pub fn apply(&mut self, change: &TicketChange, now: DateTime<Utc>) {
        self.status = change.status;

        match &change.buyer {
            BuyerUpdate::Keep => {}
            BuyerUpdate::Set(buyer) => {
                self.buyer_name = Some(buyer.name.clone());
                self.buyer_email.clone_from(&buyer.email);
                self.buyer_phone.clone_from(&buyer.phone);
                self.transaction_id.clone_from(&buyer.transaction_id);
            }
            BuyerUpdate::Clear => {
                self.buyer_name = None;
                self.buyer_email = None;
                self.buyer_phone = None;
                self.transaction_id = None;
            }
        }

        if let Some(notes) = &change.notes {
            self.notes = Some(notes.clone());
        }

        match change.status {
            TicketStatus::Available => {
                self.reserved_at = None;
                self.sold_at = None;
            }
            TicketStatus::Reserved => {
                self.reserved_at = Some(now);
                self.sold_at = None;
            }
            TicketStatus::Sold => {
                self.sold_at = Some(now);
            }
        }

        self.updated_at = now;
    }
}

// ============================================================================
// Numbering
// ============================================================================

/// Smallest padding every pool uses.
pub const MIN_NUMBER_WIDTH: usize = 3;

/// Digits used for every number in a pool of `total` tickets.
///
/// `max(3, digits(total - 1))`: a pool of 1000 is `"000".."999"`, a pool of
/// 1001 is `"0000".."1000"`.
#[must_use]
pub fn number_width(total: u32) -> usize {
    let largest = total.saturating_sub(1);
    let digits = largest.checked_ilog10().map_or(1, |log| log as usize + 1);
    digits.max(MIN_NUMBER_WIDTH)
}

/// Format `value` for a pool of `total` tickets.
#[must_use]
pub fn format_number(value: u32, total: u32) -> TicketNumber {
    let width = number_width(total);
    TicketNumber::from_normalized(format!("{value:0width$}"))
}

/// Every number in a pool of `total` tickets, in order.
pub fn pool_numbers(total: u32) -> impl Iterator<Item = TicketNumber> {
    (0..total).map(move |value| format_number(value, total))
}

/// Fresh available tickets for a whole pool.
#[must_use]
pub fn fresh_pool(raffle_id: RaffleId, total: u32, now: DateTime<Utc>) -> Vec<Ticket> {
    pool_numbers(total)
        .map(|number| Ticket::available(raffle_id, number, now))
        .collect()
}

impl TicketNumber {
    /// Normalize user input to the padded form for a pool of `total`.
    ///
    /// Accepts surrounding whitespace and missing or extra leading zeros.
    /// Returns `None` for non-numeric input or values outside `0..total`.
    #[must_use]
    pub fn normalize(raw: &str, total: u32) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let significant = trimmed.trim_start_matches('0');
        if significant.len() > 10 {
            return None;
        }
        let value = if significant.is_empty() {
            0
        } else {
            significant.parse::<u64>().ok()?
        };
        if value >= u64::from(total) {
            return None;
        }
        let value = u32::try_from(value).ok()?;
        Some(format_number(value, total))
    }
}
