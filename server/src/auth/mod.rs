//! Authentication for the Rifa server.
//!
//! Sessions and the capability policy live in `rifa-auth`; this module
//! turns them into Axum extractors bound to [`AppState`](crate::AppState).

pub mod middleware;

pub use middleware::{Authorized, RequiredCapability, SessionUser, can};
