//! Custom Axum extractors.
//!
//! - [`ApiJson`], [`ApiPath`], [`ApiQuery`]: axum's extractors with
//!   rejections rendered as [`AppError`] bodies
//! - [`BearerToken`]: the session token from `Authorization: Bearer ...`
//! - [`CorrelationId`]: the request's correlation ID
//! - [`ClientIp`]: client IP address from proxy headers
//!
//! # Examples
//!
//! ```ignore
//! use rifa_web::extractors::{ApiJson, BearerToken, ClientIp, CorrelationId};
//!
//! async fn logout(
//!     State(state): State<AppState>,
//!     token: BearerToken,
//!     correlation_id: CorrelationId,
//! ) -> Result<StatusCode, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, "Logging out");
//!     state.accounts.logout(&token.0).await?;
//!     Ok(StatusCode::NO_CONTENT)
//! }
//! ```

use crate::error::AppError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use rifa_auth::{AuthError, SessionToken};
use std::net::{IpAddr, Ipv4Addr};
use uuid::Uuid;

/// JSON body whose parse failures become `400` [`AppError`]s.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path parameters whose parse failures become `400` [`AppError`]s.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query string whose parse failures become `400` [`AppError`]s.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Session token from the `Authorization: Bearer <token>` header.
///
/// A missing header, another scheme or an empty token is rejected with
/// `401 Unauthorized`.
#[derive(Debug, Clone)]
pub struct BearerToken(pub SessionToken);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers)
            .map(|token| Self(SessionToken::from(token)))
            .ok_or_else(|| AuthError::MissingToken.into())
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Correlation ID for request tracing.
///
/// Uses the ID assigned by
/// [`correlation_id_layer`](crate::middleware::correlation_id_layer) when it
/// is installed, otherwise the `X-Correlation-ID` header, otherwise a fresh
/// UUID v4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(assigned) = parts.extensions.get::<Self>() {
            return Ok(*assigned);
        }

        let correlation_id = parts
            .headers
            .get(crate::middleware::CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Client IP address.
///
/// # Priority
///
/// 1. `X-Forwarded-For` (first IP in the list)
/// 2. `X-Real-IP`
/// 3. Localhost
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(extract_client_ip(&parts.headers)))
    }
}

/// Extract client IP from proxy headers.
fn extract_client_ip(headers: &HeaderMap) -> IpAddr {
    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());

    let real_ip = || {
        headers
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    fn request_parts(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_bearer_token_from_header() {
        let mut parts = request_parts(
            Request::builder()
                .header(header::AUTHORIZATION, "Bearer abc.DEF-123")
                .body(())
                .expect("Valid request"),
        );
        let token = BearerToken::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");
        assert_eq!(token.0.as_str(), "abc.DEF-123");
    }

    #[tokio::test]
    async fn test_bearer_token_rejections() {
        for value in ["Basic abc", "Bearer", "Bearer   ", "abc"] {
            let mut parts = request_parts(
                Request::builder()
                    .header(header::AUTHORIZATION, value)
                    .body(())
                    .expect("Valid request"),
            );
            let rejection = BearerToken::from_request_parts(&mut parts, &())
                .await
                .expect_err("Should reject");
            assert_eq!(rejection.status(), StatusCode::UNAUTHORIZED, "{value}");
        }

        let mut parts = request_parts(Request::builder().body(()).expect("Valid request"));
        assert!(BearerToken::from_request_parts(&mut parts, &()).await.is_err());
    }

    #[tokio::test]
    async fn test_correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let mut parts = request_parts(
            Request::builder()
                .header("X-Correlation-ID", uuid.to_string())
                .body(())
                .expect("Valid request"),
        );
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id.0, uuid);
    }

    #[tokio::test]
    async fn test_correlation_id_prefers_extension() {
        let assigned = CorrelationId(Uuid::new_v4());
        let mut parts = request_parts(
            Request::builder()
                .header("X-Correlation-ID", Uuid::new_v4().to_string())
                .body(())
                .expect("Valid request"),
        );
        parts.extensions.insert(assigned);

        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");
        assert_eq!(correlation_id, assigned);
    }

    #[tokio::test]
    async fn test_client_ip_priority() {
        let mut parts = request_parts(
            Request::builder()
                .header("X-Forwarded-For", "203.0.113.1, 198.51.100.1")
                .header("X-Real-IP", "198.51.100.42")
                .body(())
                .expect("Valid request"),
        );
        let client_ip = ClientIp::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");
        assert_eq!(client_ip.0.to_string(), "203.0.113.1");

        let mut parts = request_parts(
            Request::builder()
                .header("X-Real-IP", "198.51.100.42")
                .body(())
                .expect("Valid request"),
        );
        let client_ip = ClientIp::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");
        assert_eq!(client_ip.0.to_string(), "198.51.100.42");
    }

    #[tokio::test]
    async fn test_client_ip_fallback() {
        let mut parts = request_parts(Request::builder().body(()).expect("Valid request"));
        let client_ip = ClientIp::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");
        assert_eq!(client_ip.0.to_string(), "127.0.0.1");
    }
}
