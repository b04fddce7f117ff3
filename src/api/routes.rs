//! API route configuration.

use crate::api::handlers::{
    create_link_handler, delete_link_handler, get_link_handler, list_links_handler, ping_handler,
    update_link_handler,
};
use crate::state::AppState;
use axum::{Router, routing::get};

/// Versioned API routes, mounted under `/v1`.
///
/// # Endpoints
///
/// - `GET    /ping`         - Liveness probe
/// - `GET    /urls`         - List all links
/// - `POST   /urls`         - Shorten a URL
/// - `GET    /urls/{slug}`  - Resolve a slug and count the hit
/// - `PUT    /urls/{slug}`  - Retarget a slug
/// - `DELETE /urls/{slug}`  - Delete a slug
pub fn v1_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/urls", get(list_links_handler).post(create_link_handler))
        .route(
            "/urls/{slug}",
            get(get_link_handler)
                .put(update_link_handler)
                .delete(delete_link_handler),
        )
}
