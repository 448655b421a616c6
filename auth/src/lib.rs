//! # Rifa Authentication & Authorization
//!
//! Accounts, opaque session tokens and the role capability policy for the
//! Rifa backend.
//!
//! ## Features
//!
//! - **Passwords**: argon2 PHC strings, never serialized
//! - **Sessions**: random bearer tokens with a TTL, stored under a SHA-256
//!   of the token (Redis in production, in memory in tests)
//! - **Policy**: one role → capability matrix, checked per endpoint
//!
//! ## Flow
//!
//! ```text
//! login(username, password) → SessionToken ─┐
//!                                           ▼
//! Authorization: Bearer <token> → authenticate → User → authorize(Capability)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use rifa_auth::{AccountService, AuthConfig, Credentials};
//!
//! let accounts = AccountService::new(&stores, sessions, clock, AuthConfig::default());
//! let login = accounts.login(Credentials::new("ana", "correct horse")).await?;
//! let user = accounts.authenticate(&login.token).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod error;
pub mod password;
pub mod policy;
pub mod service;
pub mod session;
pub mod stores;

#[cfg(feature = "test-utils")]
pub mod mocks;

// Re-export main types for convenience
pub use config::AuthConfig;
pub use error::{AuthError, Result};
pub use policy::Capability;
pub use service::{AccountService, Credentials, LoginSession, NewAccount, Profile, UserChanges};
pub use session::{Session, SessionStore, SessionToken};
