//! Safety checks to keep page output away from source files.
//!
//! Output directories are created and overwritten freely, so they must never
//! coincide with the catalog, the template, or the cover source directory.

use std::path::{Component, Path, PathBuf};

use crate::error::FanlinkError;

/// Lexically normalize a path (drop `.`, fold `..`) without touching the filesystem.
fn lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Validates that an output directory is safe to write into.
///
/// Checks:
/// - Output cannot be an existing regular file
/// - Output cannot be the same as any of the provided source paths
/// - Output cannot live inside any source directory
///
/// # Arguments
/// * `output` - The directory that pages will be written under
/// * `source_paths` - Source files/directories that must not be written to
///
/// # Returns
/// * `Ok(())` if the output directory is safe
/// * `Err` with a descriptive message if the check fails
pub fn validate_output_dir(output: &Path, source_paths: &[&Path]) -> Result<(), FanlinkError> {
    if output.as_os_str().is_empty() {
        return Err(FanlinkError::UnsafeOutput("output directory is empty".to_string()));
    }

    if output.is_file() {
        return Err(FanlinkError::UnsafeOutput(format!(
            "output '{}' is an existing file",
            output.display()
        )));
    }

    let out = lexical(output);
    for source in source_paths {
        let src = lexical(source);
        if out == src {
            return Err(FanlinkError::UnsafeOutput(format!(
                "output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            )));
        }
        if out.starts_with(&src) && source.is_dir() {
            return Err(FanlinkError::UnsafeOutput(format!(
                "output '{}' cannot be inside source directory '{}'",
                output.display(),
                source.display()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_valid_output() {
        let dir = tempfile::tempdir().unwrap();
        let covers = dir.path().join("cover");
        fs::create_dir(&covers).unwrap();
        let songs = dir.path().join("songs.json");
        let output = dir.path().join("artist");
        assert!(validate_output_dir(&output, &[&songs, &covers]).is_ok());
    }

    #[test]
    fn test_output_equals_source() {
        let dir = tempfile::tempdir().unwrap();
        let covers = dir.path().join("cover");
        fs::create_dir(&covers).unwrap();
        let output = dir.path().join("./cover");
        let err = validate_output_dir(&output, &[&covers]).unwrap_err();
        assert!(err.to_string().contains("cannot be the same as source"));
    }

    #[test]
    fn test_output_inside_cover_dir() {
        let dir = tempfile::tempdir().unwrap();
        let covers = dir.path().join("cover");
        fs::create_dir(&covers).unwrap();
        let output = covers.join("pages");
        let err = validate_output_dir(&output, &[&covers]).unwrap_err();
        assert!(err.to_string().contains("inside source directory"));
    }

    #[test]
    fn test_output_is_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("artist");
        fs::write(&file, "x").unwrap();
        let err = validate_output_dir(&file, &[]).unwrap_err();
        assert!(err.to_string().contains("existing file"));
    }

    #[test]
    fn test_parent_dir_folding() {
        let dir = tempfile::tempdir().unwrap();
        let songs = dir.path().join("songs.json");
        let output = dir.path().join("artist/../songs.json");
        assert!(validate_output_dir(&output, &[&songs]).is_err());
    }

    #[test]
    fn test_empty_output_rejected() {
        assert!(validate_output_dir(Path::new(""), &[]).is_err());
    }
}
