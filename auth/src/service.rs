//! Account operations: registration, login, session checks and user admin.

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::password::{self, normalize_username, validate_password};
use crate::policy::{self, Capability};
use crate::session::{Session, SessionStore, SessionToken};
use chrono::{DateTime, Utc};
use rifa_core::environment::Clock;
use rifa_core::store::{StoreError, Stores, UserStore};
use rifa_core::{Role, User, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Username and password as submitted by a client.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Plain-text password
    pub password: String,
}

impl Credentials {
    /// Build credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account created by an administrator.
#[derive(Clone, Deserialize)]
pub struct NewAccount {
    /// Login name
    pub username: String,
    /// Plain-text password
    pub password: String,
    /// Role of the new account
    pub role: Role,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Partial account update; `None` leaves a field unchanged.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserChanges {
    /// New role
    pub role: Option<Role>,
    /// Enable or disable login
    pub active: Option<bool>,
    /// New plain-text password
    pub password: Option<String>,
}

impl fmt::Debug for UserChanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserChanges")
            .field("role", &self.role)
            .field("active", &self.active)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Result of a successful login.
#[derive(Clone, Debug, Serialize)]
pub struct LoginSession {
    /// Bearer token for subsequent requests
    pub token: SessionToken,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
    /// The logged-in account
    pub user: User,
}

/// The current user and what they may do.
#[derive(Clone, Debug, Serialize)]
pub struct Profile {
    /// The account
    #[serde(flatten)]
    pub user: User,
    /// Capabilities granted by the account's role
    pub capabilities: Vec<Capability>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        let capabilities = policy::capabilities(user.role);
        Self { user, capabilities }
    }
}

/// Accounts and sessions.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    config: AuthConfig,
}

impl AccountService {
    /// Build from the shared stores and a session store.
    #[must_use]
    pub fn new(
        stores: &Stores,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users: stores.users.clone(),
            sessions,
            clock,
            config,
        }
    }

    /// Public sign-up; the account gets the `user` role.
    ///
    /// # Errors
    ///
    /// Invalid username or password, a taken username, or storage errors.
    pub async fn register(&self, credentials: Credentials) -> Result<User> {
        let user = self
            .insert_account(&credentials.username, &credentials.password, Role::User)
            .await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials and open a session.
    ///
    /// Unknown usernames, wrong passwords and inactive accounts all yield
    /// [`AuthError::InvalidCredentials`].
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`], storage or session store errors.
    pub async fn login(&self, credentials: Credentials) -> Result<LoginSession> {
        let username = credentials.username.trim();
        let user = self.users.find_by_username(username).await?;

        let stored_hash = user.as_ref().map_or_else(
            || password::UNMATCHABLE_HASH.to_string(),
            |user| user.password_hash.clone(),
        );
        let verified = verify(credentials.password, stored_hash).await? && user.is_some();
        let user = match user {
            Some(user) if verified && user.active => user,
            _ => {
                tracing::warn!(username = %username, "Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let token = SessionToken::generate();
        let session = Session::starting(user.id, self.clock.now(), self.config.session_ttl);
        self.sessions
            .create(&token, &session, self.config.session_ttl)
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(LoginSession {
            token,
            expires_at: session.expires_at,
            user,
        })
    }

    /// End the session behind `token`.
    ///
    /// # Errors
    ///
    /// [`AuthError::SessionNotFound`] if the token is unknown, or session store errors.
    pub async fn logout(&self, token: &SessionToken) -> Result<()> {
        if self.sessions.delete(token).await? {
            Ok(())
        } else {
            Err(AuthError::SessionNotFound)
        }
    }

    /// Resolve a bearer token to its user.
    ///
    /// The user is re-read on every call, so deletions and deactivations
    /// take effect immediately.
    ///
    /// # Errors
    ///
    /// [`AuthError::SessionNotFound`], [`AuthError::SessionExpired`],
    /// [`AuthError::AccountDisabled`], or backend errors.
    pub async fn authenticate(&self, token: &SessionToken) -> Result<User> {
        let session = self
            .sessions
            .get(token)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if session.is_expired(self.clock.now()) {
            tracing::warn!(user_id = %session.user_id, expires_at = %session.expires_at, "Session expired");
            self.sessions.delete(token).await?;
            return Err(AuthError::SessionExpired);
        }

        match self.users.get(session.user_id).await? {
            Some(user) if user.active => Ok(user),
            _ => {
                tracing::warn!(user_id = %session.user_id, "Session user is gone or inactive");
                Err(AuthError::AccountDisabled)
            }
        }
    }

    /// Authenticate and then check one capability.
    ///
    /// # Errors
    ///
    /// Any [`authenticate`](Self::authenticate) error, or
    /// [`AuthError::InsufficientPermissions`].
    pub async fn authorize(&self, token: &SessionToken, required: Capability) -> Result<User> {
        let user = self.authenticate(token).await?;
        policy::authorize(&user, required)?;
        Ok(user)
    }

    /// The current user's profile.
    ///
    /// # Errors
    ///
    /// Any [`authenticate`](Self::authenticate) error.
    pub async fn profile(&self, token: &SessionToken) -> Result<Profile> {
        Ok(self.authenticate(token).await?.into())
    }

    /// All accounts ordered by username.
    ///
    /// # Errors
    ///
    /// Storage errors.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users.list().await?)
    }

    /// One account.
    ///
    /// # Errors
    ///
    /// [`AuthError::UserNotFound`] or storage errors.
    pub async fn get_user(&self, id: UserId) -> Result<User> {
        self.users.get(id).await?.ok_or(AuthError::UserNotFound(id))
    }

    /// Create an account with any role.
    ///
    /// # Errors
    ///
    /// Invalid username or password, a taken username, or storage errors.
    pub async fn create_user(&self, account: NewAccount) -> Result<User> {
        let user = self
            .insert_account(&account.username, &account.password, account.role)
            .await?;
        tracing::info!(user_id = %user.id, username = %user.username, role = %user.role, "User created");
        Ok(user)
    }

    /// Change role, activation or password of an account.
    ///
    /// Deactivation and password changes end the account's sessions.
    ///
    /// # Errors
    ///
    /// [`AuthError::SelfModification`] when `actor` deactivates themself,
    /// not found, validation or storage errors.
    pub async fn update_user(&self, actor: &User, id: UserId, changes: UserChanges) -> Result<User> {
        if actor.id == id && changes.active == Some(false) {
            return Err(AuthError::SelfModification(
                "you cannot deactivate your own account".to_string(),
            ));
        }

        let mut user = self.get_user(id).await?;
        let mut revoke = false;

        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(active) = changes.active {
            revoke |= user.active && !active;
            user.active = active;
        }
        if let Some(new_password) = changes.password {
            validate_password(&new_password)?;
            user.password_hash = hash(new_password).await?;
            revoke = true;
        }
        user.updated_at = self.clock.now();

        let user = self.users.update(user).await.map_err(|err| match err {
            StoreError::NotFound(_) => AuthError::UserNotFound(id),
            other => other.into(),
        })?;

        if revoke {
            let ended = self.sessions.delete_all_for_user(id).await?;
            tracing::info!(user_id = %id, sessions = ended, "Sessions revoked after account change");
        }
        tracing::info!(user_id = %id, actor_id = %actor.id, role = %user.role, active = user.active, "User updated");
        Ok(user)
    }

    /// Delete an account and its sessions.
    ///
    /// # Errors
    ///
    /// [`AuthError::SelfModification`] when `actor` deletes themself,
    /// [`AuthError::UserNotFound`], or backend errors.
    pub async fn delete_user(&self, actor: &User, id: UserId) -> Result<()> {
        if actor.id == id {
            return Err(AuthError::SelfModification(
                "you cannot delete your own account".to_string(),
            ));
        }
        if !self.users.delete(id).await? {
            return Err(AuthError::UserNotFound(id));
        }
        self.sessions.delete_all_for_user(id).await?;
        tracing::info!(user_id = %id, actor_id = %actor.id, "User deleted");
        Ok(())
    }

    /// Create the bootstrap administrator unless the username exists.
    ///
    /// Returns the new account, or `None` if one was already there.
    ///
    /// # Errors
    ///
    /// Invalid username or password, or storage errors.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<Option<User>> {
        let username = normalize_username(username)?;
        if self.users.find_by_username(&username).await?.is_some() {
            tracing::debug!(username = %username, "Bootstrap admin already exists");
            return Ok(None);
        }
        match self.insert_account(&username, password, Role::Admin).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "Bootstrap admin created");
                Ok(Some(user))
            }
            // Another instance created it first.
            Err(AuthError::DuplicateUsername(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn insert_account(&self, username: &str, password: &str, role: Role) -> Result<User> {
        let username = normalize_username(username)?;
        validate_password(password)?;
        let password_hash = hash(password.to_string()).await?;

        let now = self.clock.now();
        let user = User {
            id: UserId::new(),
            username: username.clone(),
            password_hash,
            role,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user).await.map_err(|err| match err {
            StoreError::DuplicateKey(_) => AuthError::DuplicateUsername(username),
            other => other.into(),
        })
    }
}

impl fmt::Debug for AccountService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Argon2 is CPU-bound; keep it off the async workers.
async fn hash(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| AuthError::InternalError(format!("Password hashing task failed: {e}")))?
}

async fn verify(password: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &password_hash))
        .await
        .map_err(|e| AuthError::InternalError(format!("Password verification task failed: {e}")))
}
