//! Domain layer containing business entities and slug allocation.
//!
//! This module is independent of infrastructure and transport concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Durable store trait definitions
//! - [`allocator`] - Counter-range allocator handing out unique integers
//! - [`range_authority`] - Sources of fresh counter ranges
//! - [`range_file`] - On-disk format of the persisted range
//!
//! # Slug Creation Flow
//!
//! 1. [`allocator::SlugAllocator::acquire`] returns a never-issued integer
//! 2. [`crate::utils::base62::encode`] turns it into a slug
//! 3. [`crate::application::services::LinkService`] writes the record to the
//!    store, then to the cache

pub mod allocator;
pub mod entities;
pub mod range_authority;
pub mod range_file;
pub mod repositories;
