//! Mock providers for testing.

pub mod session;

pub use session::MockSessionStore;
