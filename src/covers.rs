//! Cover image optimisation and copying.
//!
//! Covers are shrunk to a maximum width and re-encoded as JPEG under their
//! original file name, so page references stay valid. Any image that cannot
//! be decoded or encoded is copied unchanged instead.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ImageResult;
use rayon::prelude::*;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use crate::config::{is_image_file, CoverOptions};
use crate::error::FanlinkError;
use crate::models::{saved_percent, CoverOutcome, CoverReport};
use crate::progress::{advance, format_mb, phase_bar, Phase};

/// Scale `(width, height)` down to fit within `max_width`, keeping aspect
/// ratio. Never upscales.
pub fn fit_to_max_width(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    let clamped = max_width.max(1);
    if width <= clamped || height == 0 {
        return (width, height);
    }
    let scaled_height =
        ((u64::from(height) * u64::from(clamped)) + (u64::from(width) / 2)) / u64::from(width);
    (clamped, scaled_height.max(1) as u32)
}

/// True if `name` is a single plain file name (no separators, no `..`).
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn temp_path_for(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    dest.with_file_name(name)
}

/// Decode `source`, shrink it, and write it to `dest` as JPEG.
///
/// The output goes through a temporary file and is renamed into place, so a
/// failure never leaves a truncated `dest`.
pub fn optimize_image(source: &Path, dest: &Path, options: CoverOptions) -> ImageResult<()> {
    let options = options.clamped();
    let decoded = image::open(source)?;
    let (width, height) = (decoded.width(), decoded.height());
    let (target_width, target_height) = fit_to_max_width(width, height, options.max_width);
    let resized = if (target_width, target_height) != (width, height) {
        decoded.resize_exact(target_width, target_height, FilterType::Lanczos3)
    } else {
        decoded
    };
    let rgb = resized.to_rgb8();

    let temp_path = temp_path_for(dest);
    let result = (|| -> ImageResult<()> {
        let mut writer = BufWriter::new(fs::File::create(&temp_path)?);
        JpegEncoder::new_with_quality(&mut writer, options.quality).encode_image(&rgb)?;
        writer.flush()?;
        Ok(())
    })();
    let result = result.and_then(|()| fs::rename(&temp_path, dest).map_err(Into::into));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn file_len(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Optimise one cover, falling back to a plain copy on failure.
///
/// Never fails the batch: if the copy fails too, the report carries
/// `CoverOutcome::Failed` and the error is logged.
pub fn optimize_or_copy(source: &Path, dest: &Path, options: CoverOptions) -> CoverReport {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let original_bytes = file_len(source);

    let outcome = match optimize_image(source, dest, options) {
        Ok(()) => CoverOutcome::Optimized,
        Err(e) => {
            tracing::warn!(file = %file_name, error = %e, "optimisation failed, copying original");
            match fs::copy(source, dest) {
                Ok(_) => CoverOutcome::Copied,
                Err(e) => {
                    tracing::warn!(
                        file = %file_name,
                        dest = %dest.display(),
                        error = %e,
                        "cover could not be copied"
                    );
                    CoverOutcome::Failed
                }
            }
        }
    };

    let output_bytes = match outcome {
        CoverOutcome::Failed => 0,
        _ => file_len(dest),
    };
    let report = CoverReport {
        file_name,
        original_bytes,
        output_bytes,
        outcome,
    };
    tracing::info!(
        file = %report.file_name,
        original = %format_mb(report.original_bytes),
        optimized = %format_mb(report.output_bytes),
        saved = %format!("{:.1}%", report.saved_percent()),
        outcome = ?report.outcome,
        "cover processed"
    );
    report
}

/// Supported images directly inside `dir`, sorted by file name.
pub fn list_cover_images(dir: &Path) -> Result<Vec<PathBuf>, FanlinkError> {
    let entries = fs::read_dir(dir).map_err(|source| FanlinkError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut images: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_file(path))
        .collect();
    images.sort();
    Ok(images)
}

/// Optimise every supported image in `source_dir` into `dest_dir`.
///
/// Images are processed in parallel; each worker writes only its own output
/// file. Reports come back in file-name order.
pub fn optimize_covers(
    source_dir: &Path,
    dest_dir: &Path,
    options: CoverOptions,
) -> Result<Vec<CoverReport>, FanlinkError> {
    let images = list_cover_images(source_dir)?;
    if images.is_empty() {
        tracing::info!(dir = %source_dir.display(), "no cover images to optimise");
        return Ok(Vec::new());
    }
    fs::create_dir_all(dest_dir).map_err(|source| FanlinkError::Write {
        path: dest_dir.to_path_buf(),
        source,
    })?;
    tracing::info!(count = images.len(), "optimising cover images");

    let pb = phase_bar(Phase::Covers, images.len() as u64);
    let reports = images
        .par_iter()
        .map(|source| {
            let dest = dest_dir.join(source.file_name().unwrap_or_default());
            let report = optimize_or_copy(source, &dest, options);
            advance(&pb, Phase::Covers);
            report
        })
        .collect::<Vec<_>>();
    pb.finish_with_message(format!("Optimised {} covers", reports.len()));

    let before: u64 = reports.iter().map(|r| r.original_bytes).sum();
    let after: u64 = reports.iter().map(|r| r.output_bytes).sum();
    tracing::info!(
        original = %format_mb(before),
        optimized = %format_mb(after),
        saved = %format!("{:.1}%", saved_percent(before, after)),
        "cover optimisation complete"
    );
    Ok(reports)
}

/// Copy one referenced cover into `dest_dir` if it is missing there or older
/// than the source. Returns whether a copy happened.
///
/// Missing sources and names that are not plain file names are skipped with
/// a warning rather than failing the run.
pub fn copy_cover_if_needed(
    source_dir: &Path,
    dest_dir: &Path,
    name: &str,
) -> Result<bool, FanlinkError> {
    if !is_plain_file_name(name) {
        tracing::warn!(cover = name, "skipping cover with a non-plain file name");
        return Ok(false);
    }
    let source = source_dir.join(name);
    let dest = dest_dir.join(name);
    if !source.is_file() {
        tracing::warn!(cover = %source.display(), "cover image not found");
        return Ok(false);
    }

    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    let stale = match (modified(&source), modified(&dest)) {
        (_, None) => true,
        (Some(src), Some(dst)) => src > dst,
        (None, Some(_)) => false,
    };
    if !stale {
        return Ok(false);
    }

    fs::create_dir_all(dest_dir).map_err(|source| FanlinkError::Write {
        path: dest_dir.to_path_buf(),
        source,
    })?;
    fs::copy(&source, &dest).map_err(|source| FanlinkError::Write {
        path: dest.clone(),
        source,
    })?;
    tracing::info!(cover = name, "copied cover image");
    Ok(true)
}
