//! Utility functions for slug encoding and URL validation.
//!
//! - [`base62`] - Slug encoding, decoding and validation
//! - [`target_url`] - Target URL validation

pub mod base62;
pub mod target_url;
