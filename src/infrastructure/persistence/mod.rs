//! Durable store implementations.
//!
//! Concrete implementations of [`crate::domain::repositories::DurableStore`].
//!
//! # Stores
//!
//! - [`PgRecordStore`] - PostgreSQL via SQLx
//! - [`MemoryRecordStore`] - Process-local, for development and tests

pub mod memory_record_store;
pub mod pg_record_store;

pub use memory_record_store::MemoryRecordStore;
pub use pg_record_store::PgRecordStore;
