//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! progress tracking, and formatted summaries of a run report.

use crate::organizer::{MoveOutcome, Report, ReportEntry, Summary};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for operations
/// - Summary tables with statistics
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use downsort::output::OutputFormatter;
    /// OutputFormatter::success("Downloads organized");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for `total` files.
    ///
    /// ```no_run
    /// use downsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        let pb = ProgressBar::new(total);
        pb.set_style(style);
        pb
    }

    /// Prints one report line, relative to the source directory.
    pub fn entry(entry: &ReportEntry, source_dir: &Path) {
        let relative = |path: &Path| {
            path.strip_prefix(source_dir)
                .unwrap_or(path)
                .display()
                .to_string()
        };
        match &entry.outcome {
            MoveOutcome::Moved { to, .. } => {
                println!(" {} {} → {}", "✓".green(), entry.name, relative(to));
            }
            MoveOutcome::WouldMove { to, .. } => {
                println!(" {} {} → {}", "→".yellow(), entry.name, relative(to));
            }
            MoveOutcome::Skipped { reason } => {
                println!(" {} {} ({})", "-".dimmed(), entry.name, reason.to_string().dimmed());
            }
            MoveOutcome::Failed { reason } => {
                eprintln!(" {} {}: {}", "✗".red(), entry.name, reason);
            }
        }
    }

    /// Prints a summary table with file counts by category.
    pub fn summary_table(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let max_category_len = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = max_category_len
        );
    }

    /// Prints the per-outcome counts of a run.
    pub fn outcome_summary(summary: &Summary, dry_run: bool) {
        let relocated = if dry_run {
            format!("{} would move", summary.would_move)
        } else {
            format!("{} moved", summary.moved)
        };
        let failed = format!("{} failed", summary.failed);
        println!(
            "{}, {} skipped, {}",
            relocated.green(),
            summary.skipped,
            if summary.failed > 0 {
                failed.red()
            } else {
                failed.normal()
            }
        );
    }

    /// Prints the full report: per-file lines, category table and totals.
    pub fn report(report: &Report) {
        if report.entries.is_empty() {
            Self::info("No files found to organize.");
            return;
        }

        for entry in &report.entries {
            Self::entry(entry, &report.source_dir);
        }

        let counts = report.category_counts();
        if !counts.is_empty() {
            Self::summary_table(&counts, counts.values().sum());
        }
        println!();
        Self::outcome_summary(&report.summary, report.dry_run);
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
