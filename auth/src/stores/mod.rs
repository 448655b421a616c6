//! Storage implementations for the auth system.
//!
//! - **Session Store** (Redis) - Ephemeral session storage with TTL
//!
//! User accounts live in the shared [`rifa_core::store::UserStore`].

pub mod session_redis;

// Re-exports
pub use session_redis::RedisSessionStore;
