//! Writing fanlink pages for a resolved catalog.
//!
//! Each resolved release gets `{output}/{label_folder}/{song_number}/index.html`.
//! Pages are rendered and written in parallel. Two releases can still map to
//! one directory when a suffixed folder name matches another label's slug
//! (e.g. slug `acme-2` vs. the second `acme`); such writes are serialized in
//! catalog order so the last one wins, matching a sequential run.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{GeneratorConfig, PAGE_FILE_NAME};
use crate::covers::{copy_cover_if_needed, optimize_covers};
use crate::error::FanlinkError;
use crate::models::{GeneratedPage, ResolvedRelease, RunStats};
use crate::paths::release_path;
use crate::progress::{advance, phase_bar, Phase};
use crate::template::render_page;

/// Where a release's page goes and how it is reported, without writing anything.
pub fn plan_page(config: &GeneratorConfig, resolved: &ResolvedRelease<'_>) -> GeneratedPage {
    let path = release_path(resolved);
    GeneratedPage {
        song_title: resolved.release.song_title.clone(),
        artist: resolved.release.artist.clone(),
        url: path.url(&config.base_url),
        file_path: path.dir_under(&config.output_dir).join(PAGE_FILE_NAME),
        label_folder: path.label_folder,
        song_number: path.song_number,
    }
}

fn write_page(
    template: &str,
    resolved: &ResolvedRelease<'_>,
    page: &GeneratedPage,
) -> Result<(), FanlinkError> {
    let html = render_page(template, resolved.release, &resolved.identity)?;
    let dir = page.file_path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|source| FanlinkError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    fs::write(&page.file_path, html).map_err(|source| FanlinkError::Write {
        path: page.file_path.clone(),
        source,
    })?;
    tracing::debug!(file = %page.file_path.display(), url = %page.url, "wrote page");
    Ok(())
}

/// Group page indices by destination file, keeping first-appearance order.
fn group_by_destination(pages: &[GeneratedPage]) -> Vec<Vec<usize>> {
    let mut index: FxHashMap<&PathBuf, usize> = FxHashMap::default();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, page) in pages.iter().enumerate() {
        let g = *index.entry(&page.file_path).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(i);
    }
    groups
}

/// Render and write one page per resolved release.
///
/// With `dry_run`, nothing is written and the planned pages are returned.
/// The returned pages are in the same order as `resolved`.
pub fn generate_pages(
    config: &GeneratorConfig,
    template: &str,
    resolved: &[ResolvedRelease<'_>],
    dry_run: bool,
) -> Result<Vec<GeneratedPage>, FanlinkError> {
    let pages: Vec<GeneratedPage> = resolved.iter().map(|r| plan_page(config, r)).collect();
    if dry_run {
        tracing::info!(pages = pages.len(), "dry run, no pages written");
        return Ok(pages);
    }

    let groups = group_by_destination(&pages);
    for group in groups.iter().filter(|g| g.len() > 1) {
        tracing::warn!(
            file = %pages[group[0]].file_path.display(),
            releases = group.len(),
            "several releases map to one page, the last one wins"
        );
    }

    let pb = phase_bar(Phase::Pages, pages.len() as u64);
    groups.par_iter().try_for_each(|group| {
        for &i in group {
            write_page(template, &resolved[i], &pages[i])?;
            advance(&pb, Phase::Pages);
        }
        Ok::<(), FanlinkError>(())
    })?;
    pb.finish_with_message(format!("Wrote {} pages", pages.len()));

    Ok(pages)
}

/// Copy every referenced cover into the output cover directory when needed.
/// Used when cover optimisation is skipped or unavailable. Returns the number
/// of files copied; a cover that cannot be copied is logged and skipped.
pub fn copy_referenced_covers(
    config: &GeneratorConfig,
    resolved: &[ResolvedRelease<'_>],
) -> usize {
    let dest_dir = config.output_covers_dir();
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut copied = 0;
    for r in resolved {
        let Some(name) = r.release.cover_name() else {
            continue;
        };
        if !seen.insert(name) {
            continue;
        }
        match copy_cover_if_needed(&config.covers_dir, &dest_dir, name) {
            Ok(true) => copied += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!(cover = name, error = %e, "cover could not be copied"),
        }
    }
    copied
}

/// Cover step of a run: optimise the cover directory, or copy referenced
/// covers when optimisation is skipped, impossible or fails. Cover problems
/// are logged and counted in `stats`, never returned.
pub fn prepare_covers(
    config: &GeneratorConfig,
    resolved: &[ResolvedRelease<'_>],
    skip_optimize: bool,
    stats: &mut RunStats,
) {
    let optimized = if skip_optimize {
        false
    } else if !config.covers_dir.is_dir() {
        tracing::warn!(dir = %config.covers_dir.display(), "cover directory not found");
        false
    } else {
        match optimize_covers(&config.covers_dir, &config.output_covers_dir(), config.covers) {
            Ok(reports) => {
                stats.record_covers(&reports);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "cover optimisation failed, copying referenced covers");
                false
            }
        }
    };
    if !optimized {
        stats.covers_copied += copy_referenced_covers(config, resolved);
    }
}
