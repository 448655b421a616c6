//! Error types for web handlers.
//!
//! [`AppError`] bridges [`ServiceError`] and [`AuthError`] to HTTP
//! responses. Every error body has the shape
//! `{"code": "...", "message": "..."}`, plus `details` for
//! `TICKETS_UNAVAILABLE`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rifa_auth::AuthError;
use rifa_core::ServiceError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Server errors keep their cause in `source` for logging; the client only
/// sees the generic message.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Raffle>, AppError> {
///     let raffle = state.raffles.get(id).await?; // ServiceError → AppError
///     Ok(Json(raffle))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Structured context for the client
    details: Option<serde_json::Value>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            details: None,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Attach structured details to the response body.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code of this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// Create a 400 error for input that failed validation.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "VALIDATION_ERROR")
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN")
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND")
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_SERVER_ERROR")
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message, "SERVICE_UNAVAILABLE")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
    /// Optional structured context.
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            details: self.details,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { .. } | ServiceError::UnknownTickets { .. } => {
                Self::not_found(err.to_string())
            }
            ServiceError::Validation(message) => Self::validation(message),
            ServiceError::Duplicate(message) => {
                Self::new(StatusCode::BAD_REQUEST, message, "DUPLICATE")
            }
            ServiceError::TicketsUnavailable { tickets } => {
                let message = format!("{} ticket(s) are not available", tickets.len());
                let details = serde_json::to_value(&tickets).unwrap_or(serde_json::Value::Null);
                Self::new(StatusCode::BAD_REQUEST, message, "TICKETS_UNAVAILABLE")
                    .with_details(details)
            }
            ServiceError::DataIntegrity(detail) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Ticket data is inconsistent and needs manual intervention",
                "DATA_INTEGRITY",
            )
            .with_source(anyhow::anyhow!(detail)),
            ServiceError::Store(source) => {
                Self::internal("An internal error occurred").with_source(source.into())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InsufficientPermissions { required } => {
                Self::forbidden(format!("missing capability: {required}"))
            }
            AuthError::Validation(message) | AuthError::SelfModification(message) => {
                Self::validation(message)
            }
            AuthError::DuplicateUsername(_) => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string(), "DUPLICATE")
            }
            AuthError::UserNotFound(_) => Self::not_found(err.to_string()),
            AuthError::Store(source) => {
                Self::internal("An internal error occurred").with_source(source.into())
            }
            AuthError::SerializationError(_) | AuthError::InternalError(_) => {
                Self::internal("An internal error occurred").with_source(err.into())
            }
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::AccountDisabled => Self::unauthorized(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use rifa_core::{StoreError, TicketNumber, TicketStatus, UnavailableTicket};

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[tokio::test]
    async fn test_tickets_unavailable_carries_details() {
        let err = AppError::from(ServiceError::TicketsUnavailable {
            tickets: vec![UnavailableTicket {
                number: TicketNumber::from("002"),
                status: TicketStatus::Sold,
            }],
        });
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "TICKETS_UNAVAILABLE");
        assert_eq!(body["details"][0]["number"], "002");
        assert_eq!(body["details"][0]["status"], "sold");
    }

    #[tokio::test]
    async fn test_store_errors_hide_internals() {
        let err = AppError::from(ServiceError::Store(StoreError::Database(
            "connection refused on 10.0.0.3".to_string(),
        )));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["message"].as_str().unwrap().contains("10.0.0.3"));
        assert!(body.get("details").is_none());
    }

    #[test]
    fn test_service_error_statuses() {
        assert_eq!(
            AppError::from(ServiceError::not_found("raffle", "r1")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ServiceError::UnknownTickets {
                numbers: vec![TicketNumber::from("007")]
            })
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ServiceError::Duplicate("taken".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ServiceError::DataIntegrity("pool".into())).code(),
            "DATA_INTEGRITY"
        );
    }

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(AppError::from(AuthError::SessionExpired).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::from(AuthError::InvalidCredentials).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::from(AuthError::InsufficientPermissions {
                required: rifa_auth::Capability::ManageUsers
            })
            .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(AuthError::SelfModification("no".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
