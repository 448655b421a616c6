//! Static uploads (prize images and the like).
//!
//! Files are immutable once uploaded, so hits are cached for a year. Misses
//! answer with the usual JSON error body.

use crate::error::AppError;
use axum::{
    Router,
    handler::HandlerWithoutStateExt,
    http::{HeaderValue, header},
    middleware::map_response,
    response::Response,
};
use std::path::Path;
use tower_http::services::ServeDir;

/// `Cache-Control` for served uploads.
pub const UPLOADS_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Router serving `dir` under `/uploads`.
pub fn uploads_router<S>(dir: impl AsRef<Path>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let files = ServeDir::new(dir).not_found_service(missing_upload.into_service());
    Router::new()
        .nest_service("/uploads", files)
        .layer(map_response(cache_hits))
}

async fn missing_upload() -> AppError {
    AppError::not_found("file not found")
}

async fn cache_hits(mut response: Response) -> Response {
    if response.status().is_success() {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(UPLOADS_CACHE_CONTROL),
        );
    }
    response
}
