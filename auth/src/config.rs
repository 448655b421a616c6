//! Authentication configuration.

use chrono::Duration;

/// Default session lifetime in seconds (7 days).
pub const DEFAULT_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Account and session settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// How long a login stays valid.
    ///
    /// Default: 7 days
    pub session_ttl: Duration,
}

impl AuthConfig {
    /// Configuration with a specific session lifetime.
    #[must_use]
    pub const fn new(session_ttl: Duration) -> Self {
        Self { session_ttl }
    }

    /// Set session duration.
    #[must_use]
    pub const fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }
}
