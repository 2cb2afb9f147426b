//! Core data models for fanlink generation.
//!
//! This module contains the release records read from `songs.json`, the
//! identity values produced by the resolvers, and the report types written
//! at the end of a run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::catalog::{lenient_positive, null_as_default, MAX_EXPLICIT_NUMBER};

// ============================================================================
// Input Models
// ============================================================================

/// Streaming platform links keyed by platform name (`spotify`, `qq`, ...).
/// Unknown keys and non-string values are kept as-is and ignored on lookup.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, Value>);

impl Links {
    /// First non-empty string link among `keys`, in the order given.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Links {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Links(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
        )
    }
}

/// One release as read from the catalog.
///
/// `label_id` and `song_number` are `None` when the input omitted them or
/// carried a value that is not a positive integer (0, negative, fractional,
/// non-numeric). Everything besides the label fields is opaque metadata that
/// flows through to the page generator untouched.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Release {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label_name: String,
    #[serde(default, deserialize_with = "lenient_positive")]
    pub label_id: Option<u32>,
    #[serde(default, deserialize_with = "lenient_positive")]
    pub song_number: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub song_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artist: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Links,
}

impl Release {
    /// Cover file name, treating an empty string as "no cover".
    pub fn cover_name(&self) -> Option<&str> {
        self.cover.as_deref().filter(|c| !c.is_empty())
    }

    /// Requested label id, if it is in `1..=MAX_EXPLICIT_NUMBER`.
    pub fn explicit_label_id(&self) -> Option<u32> {
        in_explicit_range(self.label_id)
    }

    /// Requested song number, if it is in `1..=MAX_EXPLICIT_NUMBER`.
    pub fn explicit_song_number(&self) -> Option<u32> {
        in_explicit_range(self.song_number)
    }
}

fn in_explicit_range(value: Option<u32>) -> Option<u32> {
    value.filter(|n| (1..=MAX_EXPLICIT_NUMBER).contains(n))
}

// ============================================================================
// Resolved Identity Models
// ============================================================================

/// Label identity assigned by the label resolver.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LabelIdentity {
    pub slug: String,
    /// True iff two or more releases in the run share `slug`.
    pub duplicate_label: bool,
    /// Always >= 1.
    pub label_id: u32,
    /// True when `label_id` was allocated rather than taken from the input.
    pub label_id_assigned: bool,
}

/// A release paired with its label identity, before song numbering.
#[derive(Clone, Debug)]
pub struct LabeledRelease<'a> {
    pub release: &'a Release,
    pub label: LabelIdentity,
}

/// Full conflict-free identity of a release.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedIdentity {
    pub label: LabelIdentity,
    /// Always >= 1, unique within (slug, label_id).
    pub song_number: u32,
    /// True when `song_number` was allocated because the requested number was
    /// missing, invalid or already taken in the group.
    pub song_number_assigned: bool,
}

/// A release and its resolved identity. The release is borrowed from the
/// loaded catalog; only the identity is owned.
#[derive(Clone, Debug)]
pub struct ResolvedRelease<'a> {
    pub release: &'a Release,
    pub identity: ResolvedIdentity,
}

impl ResolvedRelease<'_> {
    pub fn slug(&self) -> &str {
        &self.identity.label.slug
    }

    pub fn label_id(&self) -> u32 {
        self.identity.label.label_id
    }

    pub fn song_number(&self) -> u32 {
        self.identity.song_number
    }
}

// ============================================================================
// Output Models
// ============================================================================

/// One written (or, in dry-run mode, planned) fanlink page.
#[derive(Clone, Debug, Serialize)]
pub struct GeneratedPage {
    pub song_title: String,
    pub artist: String,
    pub label_folder: String,
    pub song_number: u32,
    pub url: String,
    pub file_path: PathBuf,
}

/// How a single cover image ended up in the output directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverOutcome {
    /// Decoded, resized and re-encoded as JPEG.
    Optimized,
    /// Copied byte-for-byte (optimisation failed or was not attempted).
    Copied,
    /// Neither optimised nor copied; the page will reference a missing file.
    Failed,
}

#[derive(Clone, Debug, Serialize)]
pub struct CoverReport {
    pub file_name: String,
    pub original_bytes: u64,
    pub output_bytes: u64,
    pub outcome: CoverOutcome,
}

impl CoverReport {
    /// Space saved relative to the original, in percent. Negative when the
    /// output grew.
    pub fn saved_percent(&self) -> f64 {
        saved_percent(self.original_bytes, self.output_bytes)
    }
}

pub fn saved_percent(original: u64, output: u64) -> f64 {
    if original == 0 {
        0.0
    } else {
        100.0 * (original as f64 - output as f64) / original as f64
    }
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-run counters, logged at the end of a run and optionally written as JSON.
#[derive(Default, Debug, Clone, Serialize)]
pub struct RunStats {
    // Resolution
    pub releases: usize,
    pub distinct_slugs: usize,
    pub duplicate_slugs: usize,
    pub label_identities: usize,
    pub assigned_label_ids: usize,
    pub assigned_song_numbers: usize,

    // Output
    pub pages_written: usize,
    pub covers_optimized: usize,
    pub covers_copied: usize,
    pub covers_failed: usize,
    pub cover_bytes_before: u64,
    pub cover_bytes_after: u64,

    // Timing
    pub elapsed_seconds: f64,
}

impl RunStats {
    /// Fill the resolution counters from a resolved catalog.
    pub fn record_resolution(&mut self, resolved: &[ResolvedRelease<'_>]) {
        let mut slugs: BTreeMap<&str, usize> = BTreeMap::new();
        let mut identities: BTreeSet<(&str, u32)> = BTreeSet::new();
        for r in resolved {
            *slugs.entry(r.slug()).or_default() += 1;
            identities.insert((r.slug(), r.label_id()));
        }
        self.releases = resolved.len();
        self.distinct_slugs = slugs.len();
        self.duplicate_slugs = slugs.values().filter(|&&n| n > 1).count();
        self.label_identities = identities.len();
        self.assigned_label_ids = resolved
            .iter()
            .filter(|r| r.identity.label.label_id_assigned)
            .count();
        self.assigned_song_numbers = resolved
            .iter()
            .filter(|r| r.identity.song_number_assigned)
            .count();
    }

    pub fn record_covers(&mut self, reports: &[CoverReport]) {
        for report in reports {
            match report.outcome {
                CoverOutcome::Optimized => self.covers_optimized += 1,
                CoverOutcome::Copied => self.covers_copied += 1,
                CoverOutcome::Failed => self.covers_failed += 1,
            }
            self.cover_bytes_before += report.original_bytes;
            self.cover_bytes_after += report.output_bytes;
        }
    }

    /// Log stats at debug level in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            tracing::debug!(phase, "stats\n{}", json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
