//! Sessions and their storage.
//!
//! A login produces a random [`SessionToken`] handed to the client. Stores
//! never see the raw token: they key sessions by
//! [`SessionToken::storage_key`], a SHA-256 of it.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rifa_core::UserId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`SessionStore`] methods.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Random bytes per token.
const TOKEN_BYTES: usize = 32;

/// Opaque bearer token.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a cryptographically secure random token.
    ///
    /// Returns a 256-bit random token encoded as base64url (43 characters).
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut random_bytes = [0u8; TOKEN_BYTES];
        rng.fill_bytes(&mut random_bytes);
        Self(URL_SAFE_NO_PAD.encode(random_bytes))
    }

    /// Token text as sent by the client.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which stores keep the session.
    #[must_use]
    pub fn storage_key(&self) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl From<String> for SessionToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for SessionToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// A logged-in user's session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Owner
    pub user_id: UserId,
    /// Login time
    pub created_at: DateTime<Utc>,
    /// Sessions are rejected from this instant on
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Session starting at `now` and lasting `ttl`.
    #[must_use]
    pub fn starting(user_id: UserId, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Whether the session is past its expiry at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Session persistence with TTL-based expiration.
///
/// Implementations must be safe to share across request handlers.
pub trait SessionStore: Send + Sync {
    /// Store a session for `ttl`.
    ///
    /// # Errors
    ///
    /// Backend failures, or a session already stored under this token.
    fn create<'a>(
        &'a self,
        token: &'a SessionToken,
        session: &'a Session,
        ttl: Duration,
    ) -> SessionFuture<'a, ()>;

    /// Look up the session for a token; `None` if unknown or evicted.
    ///
    /// # Errors
    ///
    /// Backend or decoding failures.
    fn get<'a>(&'a self, token: &'a SessionToken) -> SessionFuture<'a, Option<Session>>;

    /// Remove one session. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn delete<'a>(&'a self, token: &'a SessionToken) -> SessionFuture<'a, bool>;

    /// Remove every session of a user. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn delete_all_for_user(&self, user_id: UserId) -> SessionFuture<'_, u64>;
}
