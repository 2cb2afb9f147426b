//! Full identity resolution: label identities, then song numbers.

use crate::identity::resolve_labels;
use crate::models::{Release, ResolvedRelease};
use crate::numbering::resolve_song_numbers;

/// Resolve every release in `releases` to a conflict-free identity.
///
/// Pure and total. The returned records borrow from `releases`; see
/// `resolve_song_numbers` for output ordering.
pub fn resolve_catalog(releases: &[Release]) -> Vec<ResolvedRelease<'_>> {
    let labeled = resolve_labels(releases);
    let resolved = resolve_song_numbers(labeled);
    tracing::debug!(
        releases = releases.len(),
        resolved = resolved.len(),
        "resolved catalog"
    );
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::release_path;
    use rustc_hash::{FxHashMap, FxHashSet};

    fn release(label: &str, id: Option<u32>, number: Option<u32>) -> Release {
        Release {
            label_name: label.to_string(),
            label_id: id,
            song_number: number,
            ..Release::default()
        }
    }

    fn position(releases: &[Release], r: &ResolvedRelease<'_>) -> usize {
        releases
            .iter()
            .position(|x| std::ptr::eq(x, r.release))
            .unwrap()
    }

    /// Deterministic xorshift for reproducible catalogs.
    struct Rng(u64);

    impl Rng {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn below(&mut self, n: u64) -> u64 {
            self.next() % n
        }
    }

    fn random_catalog(rng: &mut Rng) -> Vec<Release> {
        const LABELS: &[&str] = &["Night City", "night-city!!", "Acme", "ACME ", "", "???", "Solo"];
        let len = rng.below(25) as usize;
        (0..len)
            .map(|_| {
                let label = LABELS[rng.below(LABELS.len() as u64) as usize];
                let id = match rng.below(3) {
                    0 => None,
                    _ => Some(rng.below(4) as u32 + 1),
                };
                let number = match rng.below(3) {
                    0 => None,
                    _ => Some(rng.below(6) as u32 + 1),
                };
                release(label, id, number)
            })
            .collect()
    }

    #[test]
    fn test_scenario_colliding_label_names() {
        let releases = vec![release("Night City", None, None), release("night-city!!", None, None)];
        let resolved = resolve_catalog(&releases);
        let paths: Vec<String> = resolved
            .iter()
            .map(|r| release_path(r).label_folder)
            .collect();
        assert_eq!(paths, vec!["night-city", "night-city-2"]);
        assert!(resolved.iter().all(|r| r.identity.label.duplicate_label));
        assert_eq!(resolved[0].label_id(), 1);
        assert_eq!(resolved[1].label_id(), 2);
    }

    #[test]
    fn test_scenario_duplicate_song_numbers() {
        let releases = vec![
            release("Acme", Some(1), Some(3)),
            release("Acme", Some(1), Some(3)),
            release("Acme", Some(1), None),
        ];
        let resolved = resolve_catalog(&releases);
        let mut by_input: Vec<(usize, u32)> = resolved
            .iter()
            .map(|r| (position(&releases, r), r.song_number()))
            .collect();
        by_input.sort();
        assert_eq!(by_input, vec![(0, 3), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_scenario_explicit_id_not_reused() {
        let releases = vec![release("Acme", Some(5), None), release("Acme", None, None)];
        let resolved = resolve_catalog(&releases);
        let mut ids: Vec<u32> = resolved.iter().map(|r| r.label_id()).collect();
        ids.sort();
        assert_eq!(ids, vec![5, 6]);
    }

    #[test]
    fn test_scenario_empty_label() {
        let releases = vec![release("", None, None)];
        let resolved = resolve_catalog(&releases);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].slug(), "");
        assert!(!resolved[0].identity.label.duplicate_label);
        let path = release_path(&resolved[0]);
        assert_eq!(path.label_folder, "");
        assert_eq!(path.song_number, 1);
    }

    #[test]
    fn test_every_release_resolved_once() {
        let mut rng = Rng(0x9E37_79B9_7F4A_7C15);
        for _ in 0..200 {
            let releases = random_catalog(&mut rng);
            let resolved = resolve_catalog(&releases);
            assert_eq!(resolved.len(), releases.len());
            let seen: FxHashSet<usize> = resolved.iter().map(|r| position(&releases, r)).collect();
            assert_eq!(seen.len(), releases.len());
        }
    }

    #[test]
    fn test_identity_triples_are_unique() {
        let mut rng = Rng(0xDEAD_BEEF_CAFE_F00D);
        for _ in 0..200 {
            let releases = random_catalog(&mut rng);
            let resolved = resolve_catalog(&releases);
            let mut seen = FxHashSet::default();
            for r in &resolved {
                assert!(r.label_id() >= 1);
                assert!(r.song_number() >= 1);
                assert!(
                    seen.insert((r.slug().to_string(), r.label_id(), r.song_number())),
                    "duplicate triple in {:?}",
                    releases
                );
            }
        }
    }

    #[test]
    fn test_explicit_values_preserved() {
        let mut rng = Rng(0x0123_4567_89AB_CDEF);
        for _ in 0..200 {
            let releases = random_catalog(&mut rng);
            let resolved = resolve_catalog(&releases);

            // Explicit ids always survive.
            for r in &resolved {
                if let Some(id) = r.release.label_id {
                    assert_eq!(r.label_id(), id);
                }
            }

            // Within a group, each distinct explicit number is kept by the
            // first member (in input order) that asked for it.
            let mut first_claim: FxHashMap<(String, u32, u32), usize> = FxHashMap::default();
            for r in &resolved {
                if let Some(n) = r.release.song_number {
                    let key = (r.slug().to_string(), r.label_id(), n);
                    let pos = position(&releases, r);
                    let entry = first_claim.entry(key).or_insert(pos);
                    *entry = (*entry).min(pos);
                }
            }
            for r in &resolved {
                if let Some(n) = r.release.song_number {
                    let key = (r.slug().to_string(), r.label_id(), n);
                    if first_claim[&key] == position(&releases, r) {
                        assert_eq!(r.song_number(), n);
                        assert!(!r.identity.song_number_assigned);
                    } else {
                        assert!(r.identity.song_number_assigned);
                    }
                }
            }
        }
    }

    #[test]
    fn test_assigned_ids_are_consecutive_above_explicit_max() {
        let mut rng = Rng(0x5555_AAAA_1234_4321);
        for _ in 0..200 {
            let releases = random_catalog(&mut rng);
            let resolved = resolve_catalog(&releases);

            let mut explicit_max: FxHashMap<&str, u32> = FxHashMap::default();
            let mut assigned: FxHashMap<&str, Vec<(usize, u32)>> = FxHashMap::default();
            for r in &resolved {
                let max = explicit_max.entry(r.slug()).or_insert(0);
                match r.release.label_id {
                    Some(id) => *max = (*max).max(id),
                    None => assigned
                        .entry(r.slug())
                        .or_default()
                        .push((position(&releases, r), r.label_id())),
                }
            }
            for (slug, mut ids) in assigned {
                ids.sort();
                let base = explicit_max[slug];
                let got: Vec<u32> = ids.into_iter().map(|(_, id)| id).collect();
                let want: Vec<u32> = (1..=got.len() as u32).map(|k| base + k).collect();
                assert_eq!(got, want, "slug {:?}", slug);
            }
        }
    }

    #[test]
    fn test_assigned_song_numbers_fill_lowest_free() {
        let mut rng = Rng(0x1111_2222_3333_4444);
        for _ in 0..200 {
            let releases = random_catalog(&mut rng);
            let resolved = resolve_catalog(&releases);

            let mut groups: FxHashMap<(&str, u32), Vec<&ResolvedRelease<'_>>> =
                FxHashMap::default();
            for r in &resolved {
                groups.entry((r.slug(), r.label_id())).or_default().push(r);
            }
            for members in groups.values() {
                let kept: FxHashSet<u32> = members
                    .iter()
                    .filter(|r| !r.identity.song_number_assigned)
                    .map(|r| r.song_number())
                    .collect();
                let mut assigned: Vec<u32> = members
                    .iter()
                    .filter(|r| r.identity.song_number_assigned)
                    .map(|r| r.song_number())
                    .collect();
                assigned.sort();
                let want: Vec<u32> = (1..)
                    .filter(|n| !kept.contains(n))
                    .take(assigned.len())
                    .collect();
                assert_eq!(assigned, want);
            }
        }
    }
}
