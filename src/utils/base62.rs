//! Base62 slug encoding and validation.
//!
//! Slugs are allocator integers written in base62 with the alphabet
//! `0-9A-Za-z`, most significant digit first, without padding. Because the
//! allocator never returns the same integer twice and the encoding is
//! injective, slugs never collide.

/// Digit alphabet, in value order.
const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BASE: u64 = 62;

/// Length of the longest encoded `u64` (`u64::MAX` → `"LygHa16AHYF"`).
const MAX_ENCODED_LEN: usize = 11;

/// Encodes an integer as a base62 slug.
///
/// Zero encodes to the empty string; the allocator never issues it.
///
/// # Examples
///
/// ```
/// use slug_shortener::utils::base62::encode;
///
/// assert_eq!(encode(1_000_000), "4C92");
/// assert_eq!(encode(61), "z");
/// ```
pub fn encode(mut n: u64) -> String {
    let mut digits = [0u8; MAX_ENCODED_LEN];
    let mut pos = MAX_ENCODED_LEN;

    while n > 0 {
        pos -= 1;
        digits[pos] = ALPHABET[(n % BASE) as usize];
        n /= BASE;
    }

    // Every byte comes from ALPHABET, which is ASCII.
    String::from_utf8_lossy(&digits[pos..]).into_owned()
}

/// Decodes a base62 slug back to its integer.
///
/// Returns `None` for characters outside the alphabet or values above `u64::MAX`.
pub fn decode(slug: &str) -> Option<u64> {
    slug.bytes().try_fold(0u64, |acc, b| {
        let digit = digit_value(b)?;
        acc.checked_mul(BASE)?.checked_add(digit)
    })
}

fn digit_value(b: u8) -> Option<u64> {
    match b {
        b'0'..=b'9' => Some((b - b'0') as u64),
        b'A'..=b'Z' => Some((b - b'A') as u64 + 10),
        b'a'..=b'z' => Some((b - b'a') as u64 + 36),
        _ => None,
    }
}

/// Checks that a slug is non-empty, base62 and at most `max_len` characters.
pub fn is_valid_slug(slug: &str, max_len: usize) -> bool {
    !slug.is_empty() && slug.len() <= max_len && slug.bytes().all(|b| b.is_ascii_alphanumeric())
}
