use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use fanlink::catalog::load_catalog;
use fanlink::config::{
    resolve_against, GeneratorConfig, DEFAULT_BASE_URL, DEFAULT_COVER_DIR, DEFAULT_OUTPUT_DIR,
    DEFAULT_SONGS_FILE, DEFAULT_TEMPLATE_FILE,
};
use fanlink::generate::{generate_pages, prepare_covers};
use fanlink::models::{GeneratedPage, RunStats};
use fanlink::progress::{format_duration, format_mb, phase_spinner, set_log_only, Phase};
use fanlink::resolve::resolve_catalog;
use fanlink::safety::validate_output_dir;
use fanlink::template::validate_template;

#[derive(Parser)]
#[command(name = "fanlink")]
#[command(about = "Generate static fanlink pages from a song catalog")]
struct Args {
    /// Project root; relative paths below are resolved against it
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Song catalog (JSON array)
    #[arg(long)]
    songs: Option<PathBuf>,

    /// HTML template containing the songConfig script block
    #[arg(long)]
    template: Option<PathBuf>,

    /// Source cover image directory
    #[arg(long)]
    covers: Option<PathBuf>,

    /// Output directory for generated pages
    #[arg(long)]
    output: Option<PathBuf>,

    /// Base URL printed for each page
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Do not re-encode covers; copy referenced ones instead
    #[arg(long)]
    skip_covers: bool,

    /// Number of worker threads (0 = all cores)
    #[arg(long, default_value = "0")]
    workers: usize,

    /// Hide progress bars and log periodic progress instead
    #[arg(long)]
    log_only: bool,

    /// Write run statistics as JSON to this file
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Resolve and report pages without writing anything
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::from_root(&self.root);
        config.songs_path = resolve_against(&self.root, self.songs.as_deref(), DEFAULT_SONGS_FILE);
        config.template_path =
            resolve_against(&self.root, self.template.as_deref(), DEFAULT_TEMPLATE_FILE);
        config.covers_dir = resolve_against(&self.root, self.covers.as_deref(), DEFAULT_COVER_DIR);
        config.output_dir = resolve_against(&self.root, self.output.as_deref(), DEFAULT_OUTPUT_DIR);
        config.base_url = self.base_url.clone();
        config
    }
}

fn print_pages(pages: &[GeneratedPage]) {
    for (i, page) in pages.iter().enumerate() {
        println!("\n[{}/{}] {}", i + 1, pages.len(), page.song_title);
        println!("  Artist: {}", page.artist);
        println!("  Label folder: {}", page.label_folder);
        println!("  Song number: {}", page.song_number);
        println!("  URL: {}", page.url);
        println!("  File: {}", page.file_path.display());
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let start = Instant::now();
    let config = args.config();

    validate_output_dir(
        &config.output_dir,
        &[
            config.songs_path.as_path(),
            config.template_path.as_path(),
            config.covers_dir.as_path(),
        ],
    )?;
    validate_output_dir(&config.output_covers_dir(), &[config.covers_dir.as_path()])?;

    let releases = load_catalog(&config.songs_path).context("Failed to load song catalog")?;

    let template = std::fs::read_to_string(&config.template_path)
        .with_context(|| format!("Failed to read template {}", config.template_path.display()))?;
    validate_template(&template)?;

    let spinner = phase_spinner(Phase::Resolve);
    let resolved = resolve_catalog(&releases);
    spinner.finish_and_clear();

    let mut stats = RunStats::default();
    stats.record_resolution(&resolved);
    tracing::info!(
        releases = stats.releases,
        labels = stats.label_identities,
        duplicate_slugs = stats.duplicate_slugs,
        assigned_song_numbers = stats.assigned_song_numbers,
        "catalog resolved"
    );
    stats.log_phase("resolve");

    if args.dry_run {
        tracing::info!("dry run, skipping covers");
    } else {
        prepare_covers(&config, &resolved, args.skip_covers, &mut stats);
    }
    stats.log_phase("covers");

    let pages = generate_pages(&config, &template, &resolved, args.dry_run)?;
    if !args.dry_run {
        stats.pages_written = pages.len();
    }

    let elapsed = start.elapsed();
    stats.elapsed_seconds = elapsed.as_secs_f64();
    stats.log_phase("done");

    print_pages(&pages);

    println!("\n{:=<60}", "");
    if args.dry_run {
        println!("Dry run complete (nothing written)");
    } else {
        println!("Generation complete!");
    }
    println!("  Releases: {}", stats.releases);
    println!("  Label folders: {}", stats.label_identities);
    println!("  Pages: {}", pages.len());
    println!("  Reassigned song numbers: {}", stats.assigned_song_numbers);
    if stats.covers_optimized > 0 {
        println!(
            "  Covers: {} optimised, {} -> {}",
            stats.covers_optimized,
            format_mb(stats.cover_bytes_before),
            format_mb(stats.cover_bytes_after)
        );
    }
    if stats.covers_copied > 0 {
        println!("  Covers copied: {}", stats.covers_copied);
    }
    if stats.covers_failed > 0 {
        println!("  Covers failed: {}", stats.covers_failed);
    }
    println!("  Output: {}", config.output_dir.display());
    println!("  Elapsed: {}", format_duration(elapsed));
    println!("{:=<60}", "");

    if let Some(path) = &args.stats {
        stats
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
        tracing::info!(file = %path.display(), "stats written");
    }

    Ok(())
}
