//! Song number resolution within a label identity.
//!
//! Explicit, valid song numbers are never moved. Members whose requested
//! number is missing, invalid or already taken receive the lowest number not
//! yet used in their (slug, label id) group.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::models::{LabeledRelease, ResolvedIdentity, ResolvedRelease};

/// Per-group accumulator for one (slug, label id) pair.
#[derive(Debug)]
struct GroupState {
    used: FxHashSet<u32>,
    /// Next candidate for allocation. Only moves forward.
    cursor: u32,
}

impl GroupState {
    fn new() -> Self {
        Self {
            used: FxHashSet::default(),
            cursor: 1,
        }
    }

    /// Reserve an explicit number. False if it is missing or already taken.
    fn reserve(&mut self, requested: Option<u32>) -> bool {
        requested.is_some_and(|n| self.used.insert(n))
    }

    /// Lowest number not yet used at or above the cursor.
    fn allocate(&mut self) -> u32 {
        while self.used.contains(&self.cursor) {
            self.cursor += 1;
        }
        let n = self.cursor;
        self.used.insert(n);
        self.cursor += 1;
        n
    }
}

/// Group labeled releases by (slug, label id) and settle every song number.
///
/// Groups are emitted in order of first appearance in the input. Within a
/// group, members are ordered by requested number ascending, with unassigned
/// members last; ties keep input order.
pub fn resolve_song_numbers(labeled: Vec<LabeledRelease<'_>>) -> Vec<ResolvedRelease<'_>> {
    let total = labeled.len();
    let mut index: FxHashMap<(String, u32), usize> = FxHashMap::default();
    let mut groups: Vec<Vec<LabeledRelease<'_>>> = Vec::new();

    for item in labeled {
        let key = (item.label.slug.clone(), item.label.label_id);
        let idx = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[idx].push(item);
    }

    let mut resolved = Vec::with_capacity(total);
    for mut group in groups {
        // Stable: equal requests keep input order, so the first one wins.
        group.sort_by_key(|m| {
            let n = m.release.explicit_song_number();
            (n.is_none(), n)
        });

        // Reserve every explicit number before allocating, so a collision
        // never takes a number some later member asked for.
        let mut state = GroupState::new();
        let reserved: Vec<bool> = group
            .iter()
            .map(|m| state.reserve(m.release.explicit_song_number()))
            .collect();

        for (member, kept) in group.into_iter().zip(reserved) {
            let song_number = match (kept, member.release.explicit_song_number()) {
                (true, Some(n)) => n,
                _ => state.allocate(),
            };
            resolved.push(ResolvedRelease {
                release: member.release,
                identity: ResolvedIdentity {
                    label: member.label,
                    song_number,
                    song_number_assigned: !kept,
                },
            });
        }
    }
    resolved
}
