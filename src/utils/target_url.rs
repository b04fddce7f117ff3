//! Validation of target URLs submitted for shortening.

use url::Url;

/// Reasons a target URL is rejected.
#[derive(Debug, thiserror::Error)]
pub enum TargetUrlError {
    #[error("Missing URL")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL has no host")]
    MissingHost,
}

/// Validates a target URL and returns it as submitted, minus surrounding whitespace.
///
/// The URL must be absolute, use `http` or `https`, and name a host. Parsing
/// only decides acceptance; the stored string is never rewritten.
///
/// # Errors
///
/// See [`TargetUrlError`].
pub fn validate_target(input: &str) -> Result<String, TargetUrlError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TargetUrlError::Empty);
    }

    let url = Url::parse(input).map_err(|e| TargetUrlError::InvalidFormat(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(TargetUrlError::UnsupportedProtocol);
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(input.to_string()),
        _ => Err(TargetUrlError::MissingHost),
    }
}
