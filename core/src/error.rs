//! Service-layer errors.
//!
//! The web layer maps each variant to an HTTP status; see `rifa-web`.

use crate::store::StoreError;
use crate::types::{TicketNumber, TicketStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A ticket that blocked a reservation or sale, with its current status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableTicket {
    /// Ticket number
    pub number: TicketNumber,
    /// Status that failed the guard
    pub status: TicketStatus,
}

/// Errors returned by the services.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Resource does not exist.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource kind ("raffle", "promotion", ...)
        resource: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// A unique name or username is already taken.
    #[error("{0}")]
    Duplicate(String),

    /// Some requested tickets are not in a status the operation accepts.
    #[error("{} ticket(s) unavailable", tickets.len())]
    TicketsUnavailable {
        /// The offending tickets
        tickets: Vec<UnavailableTicket>,
    },

    /// Some requested numbers have no ticket in the pool.
    #[error("tickets not found: {}", join_numbers(numbers))]
    UnknownTickets {
        /// The missing numbers
        numbers: Vec<TicketNumber>,
    },

    /// Stored data violates an invariant and needs manual repair.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// Underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Shorthand for [`ServiceError::NotFound`]
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`ServiceError::Validation`]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

fn join_numbers(numbers: &[TicketNumber]) -> String {
    numbers
        .iter()
        .map(TicketNumber::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tickets_message_lists_numbers() {
        let err = ServiceError::UnknownTickets {
            numbers: vec!["007".into(), "010".into()],
        };
        assert_eq!(err.to_string(), "tickets not found: 007, 010");
    }

    #[test]
    fn store_errors_convert() {
        let err: ServiceError = StoreError::Database("connection reset".to_string()).into();
        assert!(matches!(err, ServiceError::Store(StoreError::Database(_))));
    }
}
