//! Core domain entities.
//!
//! Entities are plain data structures without persistence or transport logic.
//!
//! - [`ShortLink`] - A slug → target URL mapping with hit counter

pub mod short_link;

pub use short_link::{ShortLink, now_unix};
