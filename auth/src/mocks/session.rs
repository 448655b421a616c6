//! Mock session store for testing.

use crate::error::{AuthError, Result};
use crate::session::{Session, SessionFuture, SessionStore, SessionToken};
use chrono::Duration;
use rifa_core::UserId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock session store.
///
/// Uses in-memory storage for testing. TTLs are not enforced here;
/// expiry is judged by the caller against [`Session::expires_at`].
#[derive(Debug, Clone, Default)]
pub struct MockSessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl MockSessionStore {
    /// Create a new mock session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of stored sessions (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn session_count(&self) -> Result<usize> {
        self.with(|sessions| sessions.len())
    }

    /// Store a session as-is, bypassing the service (for testing expiry).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn insert_raw(&self, token: &SessionToken, session: Session) -> Result<()> {
        self.with(|sessions| {
            sessions.insert(token.storage_key(), session);
        })
    }

    fn with<T>(&self, f: impl FnOnce(&mut HashMap<String, Session>) -> T) -> Result<T> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?;
        Ok(f(&mut guard))
    }
}

impl SessionStore for MockSessionStore {
    fn create<'a>(
        &'a self,
        token: &'a SessionToken,
        session: &'a Session,
        _ttl: Duration,
    ) -> SessionFuture<'a, ()> {
        Box::pin(async move {
            self.with(|sessions| {
                let key = token.storage_key();
                if sessions.contains_key(&key) {
                    return Err(AuthError::InternalError("Session token already in use".into()));
                }
                sessions.insert(key, session.clone());
                Ok(())
            })?
        })
    }

    fn get<'a>(&'a self, token: &'a SessionToken) -> SessionFuture<'a, Option<Session>> {
        Box::pin(async move { self.with(|sessions| sessions.get(&token.storage_key()).cloned()) })
    }

    fn delete<'a>(&'a self, token: &'a SessionToken) -> SessionFuture<'a, bool> {
        Box::pin(async move { self.with(|sessions| sessions.remove(&token.storage_key()).is_some()) })
    }

    fn delete_all_for_user(&self, user_id: UserId) -> SessionFuture<'_, u64> {
        Box::pin(async move {
            self.with(|sessions| {
                let before = sessions.len();
                sessions.retain(|_, session| session.user_id != user_id);
                (before - sessions.len()) as u64
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_create_get_delete() {
        let store = MockSessionStore::new();
        let token = SessionToken::generate();
        let session = Session::starting(UserId::new(), Utc::now(), Duration::hours(1));

        store.create(&token, &session, Duration::hours(1)).await.unwrap();
        assert_eq!(store.get(&token).await.unwrap(), Some(session.clone()));
        assert!(store.create(&token, &session, Duration::hours(1)).await.is_err());

        assert!(store.delete(&token).await.unwrap());
        assert!(!store.delete(&token).await.unwrap());
        assert_eq!(store.get(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_all_for_user_keeps_others() {
        let store = MockSessionStore::new();
        let ana = UserId::new();
        let luis = UserId::new();
        for user in [ana, ana, luis] {
            let session = Session::starting(user, Utc::now(), Duration::hours(1));
            store.create(&SessionToken::generate(), &session, Duration::hours(1)).await.unwrap();
        }

        assert_eq!(store.delete_all_for_user(ana).await.unwrap(), 2);
        assert_eq!(store.session_count().unwrap(), 1);
    }
}
