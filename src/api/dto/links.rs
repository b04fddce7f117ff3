//! DTOs for the short link endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::ShortLink;

/// Request body for `POST /v1/urls` and `PUT /v1/urls/{slug}`.
///
/// A missing `target` deserializes as empty and fails validation, so it is
/// reported as a 400 like any other bad target.
#[derive(Debug, Deserialize, Validate)]
pub struct TargetRequest {
    /// Absolute http(s) URL the slug redirects to.
    #[serde(default)]
    #[validate(
        length(min = 1, message = "target is required"),
        url(message = "Invalid URL format")
    )]
    pub target: String,
}

/// Success envelope shared by all link endpoints.
///
/// ```json
/// { "status": 201, "message": "success", "urls": { "slug": "4C92", ... } }
/// ```
#[derive(Debug, Serialize)]
pub struct LinksEnvelope<T: Serialize> {
    pub status: u16,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<T>,
}

impl<T: Serialize> LinksEnvelope<T> {
    pub fn success(status: u16, urls: T) -> Self {
        Self {
            status,
            message: "success",
            urls: Some(urls),
        }
    }
}

impl LinksEnvelope<()> {
    /// Envelope without a payload, used by delete.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            message: "success",
            urls: None,
        }
    }
}

pub type LinkEnvelope = LinksEnvelope<ShortLink>;
pub type LinkListEnvelope = LinksEnvelope<Vec<ShortLink>>;
