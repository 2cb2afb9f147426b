//! Progress display for the phases of a fanlink run.
//!
//! Each phase gets a bar (or a spinner for resolution). With `--log-only`
//! the bars are hidden and a tracing line is emitted every few items instead,
//! which keeps CI and `tail -f` output readable.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Global flag for log-only mode (set from args in main)
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Stages of a run that report progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Resolve,
    Covers,
    Pages,
}

impl Phase {
    /// Short name used in log lines and stats.
    pub fn name(self) -> &'static str {
        match self {
            Phase::Resolve => "resolve",
            Phase::Covers => "covers",
            Phase::Pages => "pages",
        }
    }

    /// Message shown next to the bar.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Resolve => "Resolving labels and song numbers",
            Phase::Covers => "Optimising covers",
            Phase::Pages => "Writing pages",
        }
    }

    /// Items between log lines in log-only mode. Image work is slow, so
    /// covers report more often than pages.
    fn log_interval(self) -> u64 {
        match self {
            Phase::Resolve => 1,
            Phase::Covers => 10,
            Phase::Pages => 100,
        }
    }
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Format a byte count as MB with two decimals.
pub fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1_048_576.0)
}

/// Bar for a phase with `len` items. Hidden in log-only mode.
pub fn phase_bar(phase: Phase, len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg:<20} [{elapsed_precise}] [{bar:30.green/white}] {pos}/{len} ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );
    }
    pb.set_message(phase.label());
    pb
}

/// Advance `pb` by one item and, in log-only mode, log at the phase's interval.
pub fn advance(pb: &ProgressBar, phase: Phase) {
    pb.inc(1);
    let total = pb.length().unwrap_or(0);
    if should_log(pb.position(), total, phase.log_interval()) {
        let pct = 100.0 * pb.position() as f64 / total as f64;
        tracing::info!(phase = phase.name(), done = pb.position(), total, "{:.1}%", pct);
    }
}

fn should_log(current: u64, total: u64, interval: u64) -> bool {
    is_log_only() && total > 0 && (current % interval.max(1) == 0 || current == total)
}

/// Spinner for a phase without a known item count. Hidden in log-only mode.
pub fn phase_spinner(phase: Phase) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
        tracing::info!(phase = phase.name(), "started");
    } else {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{msg} {spinner} [{elapsed_precise}]")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(phase.label());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_format_mb() {
        assert_eq!(format_mb(0), "0.00 MB");
        assert_eq!(format_mb(1_048_576 * 3 / 2), "1.50 MB");
    }

    #[test]
    fn test_phase_names_and_labels() {
        assert_eq!(Phase::Covers.name(), "covers");
        assert_eq!(Phase::Pages.label(), "Writing pages");
    }

    #[test]
    fn test_advance_counts_items() {
        let pb = phase_bar(Phase::Pages, 3);
        advance(&pb, Phase::Pages);
        advance(&pb, Phase::Pages);
        assert_eq!(pb.position(), 2);
    }
}
