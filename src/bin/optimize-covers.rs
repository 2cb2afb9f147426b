//! Shrink and re-encode cover images without generating pages.
//!
//! Usage: optimize-covers [--root <dir>] [--covers <dir>] [--output <dir>]
//!
//! Reads every jpg/jpeg/png/webp in the cover directory and writes a JPEG
//! under the same file name into `{output}/cover/`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use fanlink::config::{
    resolve_against, CoverOptions, DEFAULT_COVER_DIR, DEFAULT_COVER_MAX_WIDTH,
    DEFAULT_COVER_QUALITY, DEFAULT_OUTPUT_DIR, OUTPUT_COVER_SUBDIR,
};
use fanlink::covers::optimize_covers;
use fanlink::models::{saved_percent, CoverOutcome};
use fanlink::progress::{format_duration, format_mb, set_log_only};
use fanlink::safety::validate_output_dir;

#[derive(Parser)]
#[command(name = "optimize-covers")]
#[command(about = "Resize and re-encode cover images as JPEG")]
struct Args {
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Source cover image directory
    #[arg(long)]
    covers: Option<PathBuf>,

    /// Page output directory; covers go to its cover/ subdirectory
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_COVER_MAX_WIDTH)]
    max_width: u32,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = DEFAULT_COVER_QUALITY)]
    quality: u8,

    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    set_log_only(args.log_only);

    let covers_dir = resolve_against(&args.root, args.covers.as_deref(), DEFAULT_COVER_DIR);
    let output_dir = resolve_against(&args.root, args.output.as_deref(), DEFAULT_OUTPUT_DIR);
    let dest_dir = output_dir.join(OUTPUT_COVER_SUBDIR);

    if !covers_dir.is_dir() {
        bail!("cover directory {} does not exist", covers_dir.display());
    }
    validate_output_dir(&dest_dir, &[covers_dir.as_path()])?;

    let options = CoverOptions {
        max_width: args.max_width,
        quality: args.quality,
    };

    let start = Instant::now();
    let reports = optimize_covers(&covers_dir, &dest_dir, options)
        .context("Failed to optimise covers")?;

    for report in &reports {
        let note = match report.outcome {
            CoverOutcome::Optimized => "",
            CoverOutcome::Copied => " (copied)",
            CoverOutcome::Failed => " (FAILED)",
        };
        println!(
            "  {}: {} -> {} ({:.1}% saved){}",
            report.file_name,
            format_mb(report.original_bytes),
            format_mb(report.output_bytes),
            report.saved_percent(),
            note
        );
    }

    let before: u64 = reports.iter().map(|r| r.original_bytes).sum();
    let after: u64 = reports.iter().map(|r| r.output_bytes).sum();
    let count = |outcome: CoverOutcome| reports.iter().filter(|r| r.outcome == outcome).count();
    let copied = count(CoverOutcome::Copied);
    let failed = count(CoverOutcome::Failed);

    println!("\n{:=<60}", "");
    println!("Cover optimisation complete!");
    println!(
        "  Images: {} ({} copied unchanged, {} failed)",
        reports.len(),
        copied,
        failed
    );
    println!("  Original size: {}", format_mb(before));
    println!("  Optimised size: {}", format_mb(after));
    println!("  Saved: {:.1}%", saved_percent(before, after));
    println!("  Output: {}", dest_dir.display());
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    Ok(())
}
