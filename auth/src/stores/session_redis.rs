//! Redis-based session store implementation.
//!
//! # Architecture
//!
//! Sessions are stored in Redis with:
//! - **Primary key**: `session:{sha256(token)}` → JSON-encoded [`Session`]
//! - **User index**: `user:{user_id}:sessions` (Set) → storage keys of that user's sessions
//! - **TTL**: the session lifetime; the index outlives it by one day
//!
//! # Example
//!
//! ```no_run
//! use rifa_auth::stores::RedisSessionStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisSessionStore::new("redis://127.0.0.1:6379").await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::session::{Session, SessionFuture, SessionStore, SessionToken};
use chrono::Duration;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use rifa_core::UserId;

/// Extra lifetime of the per-user index over its sessions.
const INDEX_GRACE_SECONDS: i64 = 86_400;

/// Deletes every session listed in a user's index, then the index.
const DELETE_USER_SESSIONS: &str = r"
    local user_set_key = KEYS[1]
    local storage_keys = redis.call('SMEMBERS', user_set_key)
    local deleted_count = 0

    for i, storage_key in ipairs(storage_keys) do
        if redis.call('DEL', 'session:' .. storage_key) == 1 then
            deleted_count = deleted_count + 1
        end
    end

    redis.call('DEL', user_set_key)
    return deleted_count
";

/// Redis-based session store with TTL-based expiration.
///
/// Cloning is cheap; clones share the connection manager.
#[derive(Clone)]
pub struct RedisSessionStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisSessionStore {
    /// Create a new Redis session store.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    ///
    /// # Errors
    ///
    /// Returns error if connection to Redis fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            AuthError::InternalError(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            AuthError::InternalError(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self { conn_manager })
    }

    /// Round-trip a `PING`, for readiness probes.
    ///
    /// # Errors
    ///
    /// Returns error if Redis does not answer.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AuthError::InternalError(format!("Redis ping failed: {e}")))?;
        Ok(())
    }

    /// Get the Redis key for a session.
    fn session_key(storage_key: &str) -> String {
        format!("session:{storage_key}")
    }

    /// Get the Redis key for user sessions set.
    fn user_sessions_key(user_id: UserId) -> String {
        format!("user:{user_id}:sessions")
    }

    async fn read(&self, session_key: &str) -> Result<Option<Session>> {
        let mut conn = self.conn_manager.clone();
        let encoded: Option<String> = conn.get(session_key).await.map_err(|e| {
            AuthError::InternalError(format!("Failed to get session from Redis: {e}"))
        })?;

        encoded
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| AuthError::SerializationError(e.to_string()))
            })
            .transpose()
    }
}

impl SessionStore for RedisSessionStore {
    fn create<'a>(
        &'a self,
        token: &'a SessionToken,
        session: &'a Session,
        ttl: Duration,
    ) -> SessionFuture<'a, ()> {
        Box::pin(async move {
            let mut conn = self.conn_manager.clone();
            let storage_key = token.storage_key();
            let session_key = Self::session_key(&storage_key);
            let user_sessions_key = Self::user_sessions_key(session.user_id);

            let exists: bool = conn.exists(&session_key).await.map_err(|e| {
                AuthError::InternalError(format!("Failed to check session existence: {e}"))
            })?;
            if exists {
                return Err(AuthError::InternalError("Session token already in use".into()));
            }

            let encoded = serde_json::to_string(session)
                .map_err(|e| AuthError::SerializationError(e.to_string()))?;

            #[allow(clippy::cast_sign_loss)]
            let ttl_seconds = ttl.num_seconds().max(1) as u64;
            let set_ttl_seconds = ttl.num_seconds().max(1) + INDEX_GRACE_SECONDS;

            let _: () = redis::pipe()
                .atomic()
                .set_ex(&session_key, encoded, ttl_seconds)
                .sadd(&user_sessions_key, &storage_key)
                .ignore()
                .expire(&user_sessions_key, set_ttl_seconds)
                .ignore()
                .query_async(&mut conn)
                .await
                .map_err(|e| AuthError::InternalError(format!("Failed to create session: {e}")))?;

            tracing::info!(
                user_id = %session.user_id,
                ttl_seconds = ttl_seconds,
                "Created session in Redis"
            );

            Ok(())
        })
    }

    fn get<'a>(&'a self, token: &'a SessionToken) -> SessionFuture<'a, Option<Session>> {
        Box::pin(async move { self.read(&Self::session_key(&token.storage_key())).await })
    }

    fn delete<'a>(&'a self, token: &'a SessionToken) -> SessionFuture<'a, bool> {
        Box::pin(async move {
            let storage_key = token.storage_key();
            let session_key = Self::session_key(&storage_key);

            let Some(session) = self.read(&session_key).await? else {
                return Ok(false);
            };

            let mut conn = self.conn_manager.clone();
            let (deleted,): (u64,) = redis::pipe()
                .atomic()
                .del(&session_key)
                .srem(Self::user_sessions_key(session.user_id), &storage_key)
                .ignore()
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    AuthError::InternalError(format!("Failed to delete session from Redis: {e}"))
                })?;

            tracing::info!(user_id = %session.user_id, "Deleted session from Redis");
            Ok(deleted > 0)
        })
    }

    fn delete_all_for_user(&self, user_id: UserId) -> SessionFuture<'_, u64> {
        Box::pin(async move {
            let mut conn = self.conn_manager.clone();
            let deleted_count: u64 = redis::Script::new(DELETE_USER_SESSIONS)
                .key(Self::user_sessions_key(user_id))
                .invoke_async(&mut conn)
                .await
                .map_err(|e| {
                    AuthError::InternalError(format!("Failed to execute atomic session deletion: {e}"))
                })?;

            tracing::info!(
                user_id = %user_id,
                session_count = deleted_count,
                "Deleted all user sessions"
            );

            Ok(deleted_count)
        })
    }
}
