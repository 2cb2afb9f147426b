//! Error type for catalog loading, template checks and output writes.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the I/O side of fanlink generation.
///
/// Resolution itself never fails; everything here comes from loading the
/// catalog, reading the template, or writing output. Binaries wrap these in
/// `anyhow` with extra context.
#[derive(Debug, Error)]
pub enum FanlinkError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid catalog {}: {source}", .path.display())]
    Catalog {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("template has no <script> block defining songConfig")]
    MissingSongConfig,

    #[error("unsafe output directory: {0}")]
    UnsafeOutput(String),
}
