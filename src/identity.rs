//! Label identity resolution.
//!
//! Releases are grouped by the slug of their label name. Every release keeps
//! an explicit label id from the input; releases without one are given a new
//! id above every id already claimed under the same slug, in input order.

use rustc_hash::FxHashMap;

use crate::models::{LabelIdentity, LabeledRelease, Release};
use crate::normalize::normalize_label;

/// Per-slug accumulator threaded through one `resolve_labels` call.
#[derive(Debug, Default)]
struct SlugState {
    releases: usize,
    /// Highest id claimed in the input or allocated so far.
    highest_id: u32,
}

impl SlugState {
    fn claim(&mut self, explicit: Option<u32>) {
        self.releases += 1;
        if let Some(id) = explicit {
            self.highest_id = self.highest_id.max(id);
        }
    }

    fn allocate(&mut self) -> u32 {
        self.highest_id += 1;
        self.highest_id
    }
}

/// Assign a slug, duplicate flag and label id to every release.
///
/// Output order matches input order. Never fails: an id that is missing, 0,
/// or above `MAX_EXPLICIT_NUMBER` is unassigned and gets allocated.
pub fn resolve_labels(releases: &[Release]) -> Vec<LabeledRelease<'_>> {
    let slugs: Vec<String> = releases
        .iter()
        .map(|r| normalize_label(&r.label_name))
        .collect();

    // Pass 1: count releases and reserve explicit ids per slug.
    let mut states: FxHashMap<&str, SlugState> = FxHashMap::default();
    for (release, slug) in releases.iter().zip(&slugs) {
        states.entry(slug.as_str()).or_default().claim(release.explicit_label_id());
    }

    // Pass 2: pass explicit ids through, allocate the rest first-come-first-served.
    let mut labeled = Vec::with_capacity(releases.len());
    for (release, slug) in releases.iter().zip(&slugs) {
        let state = states.entry(slug.as_str()).or_default();
        let duplicate_label = state.releases > 1;
        let (label_id, label_id_assigned) = match release.explicit_label_id() {
            Some(id) => (id, false),
            None => (state.allocate(), true),
        };
        labeled.push(LabeledRelease {
            release,
            label: LabelIdentity {
                slug: slug.clone(),
                duplicate_label,
                label_id,
                label_id_assigned,
            },
        });
    }
    labeled
}
