//! Identifier generation and stored-name composition.
//!
//! Identifiers are collision-resistant by construction: a random
//! alphanumeric prefix plus a base-36 timestamp suffix. Two calls collide
//! only when the random prefixes match within the same clock millisecond,
//! a residual probability the placer closes with an existence check.

use rand::distr::{Alphanumeric, SampleString};
use std::time::{SystemTime, UNIX_EPOCH};

/// Random prefix length for generated identifiers.
pub const DEFAULT_RANDOM_LEN: usize = 8;

const MAX_NAME_LEN: usize = 255;

/// Generate a short, URL-safe identifier: `random_len` characters drawn
/// uniformly from `[A-Za-z0-9]`, followed by the current Unix time in
/// milliseconds encoded base-36.
pub fn new_identifier(random_len: usize) -> String {
    let prefix = Alphanumeric.sample_string(&mut rand::rng(), random_len);
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("{}{}", prefix, to_base36(millis))
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    // Safety of from_utf8: buf only ever holds ASCII digits.
    String::from_utf8(buf).unwrap_or_default()
}

/// Sanitize a caller-supplied file name into a safe single path segment:
/// every character outside `[A-Za-z0-9._-]` becomes an underscore, order and
/// length preserved up to a 255-character cap. Names that sanitize to nothing
/// meaningful fall back to "file".
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .take(MAX_NAME_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(['_', '.', '-']).is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

/// Compose the final stored name from an identifier and a sanitized name.
pub fn compose_stored_name(identifier: &str, sanitized_name: &str) -> String {
    format!("{}-{}", identifier, sanitized_name)
}
