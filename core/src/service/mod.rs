//! Services holding the business rules.
//!
//! Each service is cheap to clone (it holds `Arc`s) and is built from the
//! shared [`Stores`](crate::store::Stores) bundle plus a
//! [`Clock`](crate::environment::Clock).

mod content;
mod promotions;
mod raffles;
mod tickets;

pub use content::{ContentService, SiteContent};
pub use promotions::PromotionService;
pub use raffles::{MAX_TOTAL_TICKETS, RaffleService};
pub use tickets::{
    BulkStatusUpdate, InitializedPool, MAX_BATCH, Reservation, SaleReceipt, TicketService,
};
