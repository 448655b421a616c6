//! Public site aggregate and content blocks.
//!
//! `GET /api/site` never fails: a missing active raffle or content block is
//! `null` in the body.

use crate::auth::{Authorized, can};
use crate::server::state::AppState;
use axum::{Json, extract::State};
use rifa_core::content::{ContentBlock, ContentKey};
use rifa_core::service::SiteContent;
use rifa_web::{ApiJson, ApiPath, AppError};

fn content_key(raw: &str) -> Result<ContentKey, AppError> {
    raw.parse()
        .map_err(|_| AppError::not_found(format!("Unknown content key: {raw}")))
}

/// Everything the landing page renders.
pub async fn site(State(state): State<AppState>) -> Json<SiteContent> {
    Json(state.content.site().await)
}

/// One content block.
///
/// # Errors
///
/// `404` for unknown keys and blocks never written.
pub async fn get_content(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> Result<Json<ContentBlock>, AppError> {
    let key = content_key(&key)?;
    Ok(Json(state.content.get(key).await?))
}

/// Replace a content block.
///
/// # Errors
///
/// `404` for unknown keys, `400` for bodies the key does not accept.
pub async fn put_content(
    _admin: Authorized<can::ManageContent>,
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<Json<ContentBlock>, AppError> {
    let key = content_key(&key)?;
    Ok(Json(state.content.put(key, body).await?))
}
