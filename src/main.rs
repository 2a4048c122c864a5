use anyhow::Result;
use clap::Parser;
use downsort::cli::{Cli, run_cli_with_config};
use downsort::output::OutputFormatter;
use std::path::Path;
use std::process::ExitCode;
use tracing::{Level, error};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let source_dir = cli.source_dir();

    // Configuration is validated before the log directory is created.
    let loaded = match cli.load_config() {
        Ok(loaded) => loaded,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };

    let _guard = setup_logging(&cli, &cli.log_dir())?;

    match run_cli_with_config(&source_dir, loaded, &cli.run_options()) {
        Ok(summary) if summary.report.has_failures() => Ok(ExitCode::FAILURE),
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!(error = %e, "Organizer aborted");
            OutputFormatter::error(&e.to_string());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Logs to a daily-rotated file in the log directory, keeping the last five
/// files, and mirrors warnings (everything with --verbose) to stderr.
fn setup_logging(cli: &Cli, log_dir: &Path) -> Result<WorkerGuard> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    std::fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("organizer")
        .filename_suffix("log")
        .max_log_files(5)
        .build(log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let console_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let subscriber = tracing_subscriber::registry().with(env_filter);

    if cli.json_log {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_filter(console_level),
            )
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_filter(console_level),
            )
            .init();
    }

    Ok(guard)
}
