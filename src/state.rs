//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::LinkService;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    /// Longest slug accepted on lookup, update and delete.
    pub max_slug_len: usize,
}

impl AppState {
    pub fn new(link_service: Arc<LinkService>, max_slug_len: usize) -> Self {
        Self {
            link_service,
            max_slug_len,
        }
    }
}
