//! Loading the release catalog (`songs.json`).
//!
//! The catalog is hand-edited, so parsing is deliberately forgiving: missing
//! strings become empty, and ids or song numbers that are not positive
//! integers become "unassigned" instead of failing the load.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;

use crate::error::FanlinkError;
use crate::models::Release;

/// Largest explicit id or song number accepted from input. Larger values are
/// treated as unassigned so that allocation above them cannot overflow.
pub const MAX_EXPLICIT_NUMBER: u32 = i32::MAX as u32;

/// Interpret a JSON value as a positive integer.
///
/// Accepts integral numbers (`3`, `3.0`) and numeric strings (`"3"`) in
/// `1..=MAX_EXPLICIT_NUMBER`. Everything else is `None`.
pub fn positive_from_value(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => match n.as_u64() {
            Some(n) => n,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 || f < 1.0 || f > f64::from(MAX_EXPLICIT_NUMBER) {
                    return None;
                }
                f as u64
            }
        },
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(n)
        .ok()
        .filter(|&n| (1..=MAX_EXPLICIT_NUMBER).contains(&n))
}

pub(crate) fn lenient_positive<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(positive_from_value))
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a catalog from JSON text. Input order is preserved.
pub fn parse_catalog(json: &str) -> serde_json::Result<Vec<Release>> {
    serde_json::from_str(json)
}

/// Read and parse the catalog at `path`.
pub fn load_catalog(path: &Path) -> Result<Vec<Release>, FanlinkError> {
    let data = std::fs::read_to_string(path).map_err(|source| FanlinkError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let releases = parse_catalog(&data).map_err(|source| FanlinkError::Catalog {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), releases = releases.len(), "loaded catalog");
    Ok(releases)
}
