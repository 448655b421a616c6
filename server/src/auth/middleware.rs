//! Authentication extractors for the Rifa server.
//!
//! Provides Axum extractors for:
//! - Session validation ([`SessionUser`])
//! - Capability checks ([`Authorized`]), one marker type per capability
//!
//! # Usage
//!
//! ```rust,ignore
//! use rifa_server::auth::{Authorized, SessionUser, can};
//!
//! // Require authentication
//! async fn profile(session: SessionUser) -> Json<Profile> {
//!     Json(Profile::from(session.user))
//! }
//!
//! // Require a capability
//! async fn create_raffle(
//!     _admin: Authorized<can::ManageRaffles>,
//!     State(state): State<AppState>,
//!     ApiJson(input): ApiJson<NewRaffle>,
//! ) -> Result<Json<Raffle>, AppError> {
//!     Ok(Json(state.raffles.create(input).await?))
//! }
//! ```

use crate::server::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use rifa_auth::{Capability, SessionToken, policy};
use rifa_core::User;
use rifa_web::{AppError, BearerToken, CorrelationId};
use std::fmt;
use std::marker::PhantomData;

/// Authenticated session user.
///
/// Validates the bearer token against the session store and reloads the
/// account, so a user deleted or deactivated since login is rejected.
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// The authenticated account
    pub user: User,
    /// Token the request presented
    pub token: SessionToken,
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        match state.accounts.authenticate(&token).await {
            Ok(user) => Ok(Self { user, token }),
            Err(error) => {
                let CorrelationId(correlation_id) = CorrelationId::from_request_parts(parts, state)
                    .await
                    .unwrap_or_else(|never| match never {});
                tracing::warn!(%correlation_id, %error, "Session rejected");
                Err(error.into())
            }
        }
    }
}

/// A capability an endpoint requires, named at the type level.
pub trait RequiredCapability: Send + Sync + 'static {
    /// Capability checked by [`Authorized`].
    const CAPABILITY: Capability;
}

macro_rules! capability_markers {
    ($($name:ident),* $(,)?) => {
        $(
            #[doc = concat!("Requires [`Capability::", stringify!($name), "`].")]
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl super::RequiredCapability for $name {
                const CAPABILITY: super::Capability = super::Capability::$name;
            }
        )*
    };
}

/// Marker types for [`Authorized`].
pub mod can {
    capability_markers!(
        ManageRaffles,
        ManagePromotions,
        ManageTickets,
        SellTickets,
        ViewDashboard,
        ManageUsers,
        ManageContent,
    );
}

/// A session user whose role grants `G::CAPABILITY`.
///
/// Missing or invalid sessions are rejected with `401`; a role without the
/// capability with `403`.
pub struct Authorized<G> {
    /// The authorized account
    pub user: User,
    guard: PhantomData<fn() -> G>,
}

impl<G> fmt::Debug for Authorized<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorized")
            .field("user", &self.user.username)
            .field("capability", &std::any::type_name::<G>())
            .finish()
    }
}

#[async_trait]
impl<G> FromRequestParts<AppState> for Authorized<G>
where
    G: RequiredCapability,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let SessionUser { user, .. } = SessionUser::from_request_parts(parts, state).await?;
        policy::authorize(&user, G::CAPABILITY)?;
        Ok(Self {
            user,
            guard: PhantomData,
        })
    }
}
