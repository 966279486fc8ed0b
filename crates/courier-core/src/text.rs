//! UTF-8 safe truncation for log fields.
//!
//! Device tokens are long and sensitive enough that logs only carry a
//! short prefix. Tokens are normally hex, but callers can pass anything,
//! so slicing must respect char boundaries.

/// Number of leading bytes of a device token that may appear in logs.
pub const TOKEN_LOG_PREFIX: usize = 8;

/// Truncate a string to at most `max_bytes` bytes at a char boundary.
#[inline]
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// The loggable prefix of a device token.
#[inline]
pub fn token_prefix(token: &str) -> &str {
    truncate_str(token, TOKEN_LOG_PREFIX)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
