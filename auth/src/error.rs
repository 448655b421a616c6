//! Error types for authentication and authorization operations.

use crate::policy::Capability;
use rifa_core::{StoreError, UserId};
use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failure modes of the account and session layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Authentication Errors
    // ═══════════════════════════════════════════════════════════

    /// Unknown username, wrong password or inactive account.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No usable `Authorization: Bearer` header.
    #[error("Missing or malformed bearer token")]
    MissingToken,

    /// Token does not name a live session.
    #[error("Session not found")]
    SessionNotFound,

    /// Session outlived its TTL.
    #[error("Session has expired")]
    SessionExpired,

    /// The session's user was deleted or deactivated after login.
    #[error("Account is no longer active")]
    AccountDisabled,

    // ═══════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════

    /// User lacks required permissions.
    #[error("Insufficient permissions: {required}")]
    InsufficientPermissions {
        /// Required capability that was missing
        required: Capability,
    },

    /// An admin tried to delete or deactivate their own account.
    #[error("{0}")]
    SelfModification(String),

    // ═══════════════════════════════════════════════════════════
    // Account Errors
    // ═══════════════════════════════════════════════════════════

    /// Input rejected before touching storage.
    #[error("{0}")]
    Validation(String),

    /// Username already taken.
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    /// No user with this id.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// User storage failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Session data could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Returns `true` if the caller must (re)authenticate.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rifa_auth::AuthError;
    /// assert!(AuthError::SessionExpired.is_unauthenticated());
    /// assert!(!AuthError::Validation("short".into()).is_unauthenticated());
    /// ```
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::MissingToken
                | Self::SessionNotFound
                | Self::SessionExpired
                | Self::AccountDisabled
        )
    }

    /// Returns `true` if this error is due to invalid user input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::DuplicateUsername(_) | Self::SelfModification(_)
        )
    }
}
