//! Handlers for the short link endpoints (create, read, list, update, delete).

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::links::{LinkEnvelope, LinkListEnvelope, LinksEnvelope, TargetRequest};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::base62;

/// Rejects slugs the allocator could never have produced.
fn ensure_valid_slug(state: &AppState, slug: &str) -> Result<(), AppError> {
    if base62::is_valid_slug(slug, state.max_slug_len) {
        Ok(())
    } else {
        Err(AppError::bad_request(
            "Invalid slug.",
            json!({ "slug": slug, "max_len": state.max_slug_len }),
        ))
    }
}

/// Shortens a URL.
///
/// # Endpoint
///
/// `POST /v1/urls`
///
/// # Request Body
///
/// ```json
/// { "target": "https://example.com/some/long/path" }
/// ```
///
/// # Response
///
/// **201 Created**
///
/// ```json
/// {
///   "status": 201,
///   "message": "success",
///   "urls": { "slug": "4C92", "target": "https://example.com/some/long/path", "created": 1700000000, "hits": 1 }
/// }
/// ```
///
/// # Errors
///
/// - **400 Bad Request**: missing or non-http(s) target
/// - **503 Service Unavailable**: no slug could be allocated or the store is down
pub async fn create_link_handler(
    State(state): State<AppState>,
    payload: Result<Json<TargetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LinkEnvelope>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let link = state.link_service.create(&payload.target).await?;

    Ok((
        StatusCode::CREATED,
        Json(LinksEnvelope::success(StatusCode::CREATED.as_u16(), link)),
    ))
}

/// Resolves a slug and counts the hit.
///
/// # Endpoint
///
/// `GET /v1/urls/{slug}`
///
/// The returned `hits` may lag the stored count when served from the cache.
///
/// # Errors
///
/// - **400 Bad Request**: slug is not alphanumeric or too long
/// - **404 Not Found**: unknown slug
pub async fn get_link_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkEnvelope>, AppError> {
    ensure_valid_slug(&state, &slug)?;

    let link = state.link_service.resolve(&slug).await?;

    Ok(Json(LinksEnvelope::success(StatusCode::OK.as_u16(), link)))
}

/// Lists every stored link.
///
/// # Endpoint
///
/// `GET /v1/urls`
pub async fn list_links_handler(
    State(state): State<AppState>,
) -> Result<Json<LinkListEnvelope>, AppError> {
    let links = state.link_service.list_all().await?;

    Ok(Json(LinksEnvelope::success(StatusCode::OK.as_u16(), links)))
}

/// Points a slug at a new target.
///
/// # Endpoint
///
/// `PUT /v1/urls/{slug}`
///
/// # Request Body
///
/// ```json
/// { "target": "https://example.org" }
/// ```
///
/// The hit count is kept; `created` is refreshed.
///
/// # Errors
///
/// - **400 Bad Request**: invalid slug or target
/// - **404 Not Found**: unknown slug
/// - **503 Service Unavailable**: store is down
pub async fn update_link_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<TargetRequest>, JsonRejection>,
) -> Result<Json<LinkEnvelope>, AppError> {
    ensure_valid_slug(&state, &slug)?;
    let Json(payload) = payload?;
    payload.validate()?;

    let link = state.link_service.update(&slug, &payload.target).await?;

    Ok(Json(LinksEnvelope::success(StatusCode::OK.as_u16(), link)))
}

/// Deletes a slug.
///
/// # Endpoint
///
/// `DELETE /v1/urls/{slug}`
///
/// # Response
///
/// ```json
/// { "status": 200, "message": "success" }
/// ```
///
/// # Errors
///
/// - **400 Bad Request**: invalid slug
/// - **404 Not Found**: the store holds no such slug
/// - **503 Service Unavailable**: store is down
pub async fn delete_link_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinksEnvelope<()>>, AppError> {
    ensure_valid_slug(&state, &slug)?;

    state.link_service.delete(&slug).await?;

    Ok(Json(LinksEnvelope::empty(StatusCode::OK.as_u16())))
}
