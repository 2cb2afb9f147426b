//! Destination paths for resolved releases.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::models::{LabelIdentity, ResolvedRelease};

/// Folder name for a label identity.
///
/// Only the second and later identities sharing a slug get an id suffix, so
/// the first label's URLs stay stable when a new colliding label shows up.
pub fn label_folder_name(label: &LabelIdentity) -> String {
    if label.duplicate_label && label.label_id > 1 {
        format!("{}-{}", label.slug, label.label_id)
    } else {
        label.slug.clone()
    }
}

/// `{label_folder}/{song_number}` for one release.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReleasePath {
    pub label_folder: String,
    pub song_number: u32,
}

impl ReleasePath {
    /// Directory under `root` holding this release's page.
    pub fn dir_under(&self, root: &Path) -> PathBuf {
        root.join(&self.label_folder)
            .join(self.song_number.to_string())
    }

    /// Public URL, e.g. `fan.lucetune.com/night-city-2/1`.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }
}

impl fmt::Display for ReleasePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.label_folder, self.song_number)
    }
}

pub fn release_path(resolved: &ResolvedRelease<'_>) -> ReleasePath {
    ReleasePath {
        label_folder: label_folder_name(&resolved.identity.label),
        song_number: resolved.identity.song_number,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(slug: &str, duplicate_label: bool, label_id: u32) -> LabelIdentity {
        LabelIdentity {
            slug: slug.to_string(),
            duplicate_label,
            label_id,
            label_id_assigned: false,
        }
    }

    #[test]
    fn test_label_folder_name() {
        assert_eq!(label_folder_name(&label("night-city", true, 1)), "night-city");
        assert_eq!(label_folder_name(&label("night-city", true, 2)), "night-city-2");
        // Unique slug never gets a suffix, whatever its id.
        assert_eq!(label_folder_name(&label("acme", false, 7)), "acme");
        assert_eq!(label_folder_name(&label("", false, 1)), "");
        assert_eq!(label_folder_name(&label("", true, 3)), "-3");
    }

    #[test]
    fn test_release_path_display_and_url() {
        let path = ReleasePath {
            label_folder: "night-city-2".to_string(),
            song_number: 4,
        };
        assert_eq!(path.to_string(), "night-city-2/4");
        assert_eq!(path.url("fan.lucetune.com"), "fan.lucetune.com/night-city-2/4");
        assert_eq!(path.url("https://fan.lucetune.com/"), "https://fan.lucetune.com/night-city-2/4");
        assert_eq!(
            path.dir_under(Path::new("artist")),
            Path::new("artist").join("night-city-2").join("4")
        );
    }

    #[test]
    fn test_empty_label_folder_path() {
        let path = ReleasePath {
            label_folder: String::new(),
            song_number: 1,
        };
        assert_eq!(path.to_string(), "/1");
        assert_eq!(path.dir_under(Path::new("artist")), Path::new("artist").join("1"));
    }
}
