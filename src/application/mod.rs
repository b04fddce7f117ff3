//! Application layer services implementing business logic.
//!
//! This layer coordinates the slug allocator, the durable store and the cache.
//! Services consume domain traits and provide a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Short link lifecycle across store and cache

pub mod services;
