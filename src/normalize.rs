//! Label name normalization.
//!
//! The slug produced here is the only signal used to decide whether two
//! releases belong to the same label, and it is also used verbatim as a URL
//! path segment.
//!
//! CRITICAL: Changing the slug rules changes published URLs. Run tests after changes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Separator used between alphanumeric runs in a slug.
pub const SLUG_SEPARATOR: char = '-';

/// Any run of characters outside the slug alphabet (applied after lowercasing).
static NON_SLUG_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Normalize a raw label name into its canonical slug.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single `-`, and strips separators from both ends. Total and idempotent;
/// empty or all-punctuation input yields `""`.
///
/// Non-ASCII letters are not transliterated, so "Björk" becomes `bj-rk`.
pub fn normalize_label(raw: &str) -> String {
    let lower = raw.to_lowercase();
    NON_SLUG_RUN
        .replace_all(&lower, "-")
        .trim_matches(SLUG_SEPARATOR)
        .to_string()
}

/// True if `s` is already in canonical slug form.
#[cfg(test)]
fn is_slug(s: &str) -> bool {
    !s.starts_with(SLUG_SEPARATOR)
        && !s.ends_with(SLUG_SEPARATOR)
        && !s.contains("--")
        && s.bytes().all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'-'))
}

// ============================================================================
// TESTS
// ============================================================================
