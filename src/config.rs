//! Run configuration: where inputs live and where pages are written.

use std::path::{Path, PathBuf};

pub const DEFAULT_SONGS_FILE: &str = "songs.json";
pub const DEFAULT_TEMPLATE_FILE: &str = "index.html";
pub const DEFAULT_COVER_DIR: &str = "cover";
pub const DEFAULT_OUTPUT_DIR: &str = "artist";
pub const DEFAULT_BASE_URL: &str = "fan.lucetune.com";

/// Cover subdirectory inside the output directory.
pub const OUTPUT_COVER_SUBDIR: &str = "cover";

/// Page file written inside each `{label_folder}/{song_number}` directory.
pub const PAGE_FILE_NAME: &str = "index.html";

/// Image extensions picked up from the cover directory (compared lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

pub const DEFAULT_COVER_MAX_WIDTH: u32 = 1200;
pub const DEFAULT_COVER_QUALITY: u8 = 80;

/// Cover re-encoding parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoverOptions {
    pub max_width: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

impl Default for CoverOptions {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_COVER_MAX_WIDTH,
            quality: DEFAULT_COVER_QUALITY,
        }
    }
}

impl CoverOptions {
    /// Clamp to values the encoder accepts.
    pub fn clamped(self) -> Self {
        Self {
            max_width: self.max_width.max(1),
            quality: self.quality.clamp(1, 100),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    pub songs_path: PathBuf,
    pub template_path: PathBuf,
    pub covers_dir: PathBuf,
    pub output_dir: PathBuf,
    pub base_url: String,
    pub covers: CoverOptions,
}

impl GeneratorConfig {
    /// Default layout rooted at `root`: `songs.json`, `index.html` and
    /// `cover/` as inputs, pages under `artist/`.
    pub fn from_root(root: &Path) -> Self {
        Self {
            songs_path: root.join(DEFAULT_SONGS_FILE),
            template_path: root.join(DEFAULT_TEMPLATE_FILE),
            covers_dir: root.join(DEFAULT_COVER_DIR),
            output_dir: root.join(DEFAULT_OUTPUT_DIR),
            base_url: DEFAULT_BASE_URL.to_string(),
            covers: CoverOptions::default(),
        }
    }

    pub fn output_covers_dir(&self) -> PathBuf {
        self.output_dir.join(OUTPUT_COVER_SUBDIR)
    }
}

/// Resolve an optional override against `root`. Absolute overrides are kept as-is.
pub fn resolve_against(root: &Path, value: Option<&Path>, default: &str) -> PathBuf {
    match value {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => root.join(p),
        None => root.join(default),
    }
}

/// True if `path` has one of the supported image extensions.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}
