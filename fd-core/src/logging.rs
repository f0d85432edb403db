//! Structured logging setup using the `tracing` ecosystem.
//!
//! The CLI logs to a daily-rotated file under the data directory and echoes
//! warnings (or everything, in verbose mode) to stderr so that JSON output on
//! stdout stays machine-readable.

use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::constants::LOG_FILE_NAME;
use crate::error::FdResult;

/// Guard that keeps the non-blocking log writer alive.
/// Drop this to flush and close the log file.
pub struct LogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Build an `EnvFilter` from a level directive, falling back to `info`.
fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// * `level` - file log directive ("debug", "fd_services=trace", ...)
/// * `log_dir` - directory for the rolling log file
/// * `json_output` - write the file log as JSON lines
/// * `verbose` - echo the same level to stderr instead of warnings only
pub fn init_logging(level: &str, log_dir: &Path, json_output: bool, verbose: bool) -> FdResult<LogGuard> {
    std::fs::create_dir_all(log_dir)?;

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE_NAME));

    let file_layer = if json_output {
        fmt::layer()
            .with_writer(writer)
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let console_level = if verbose { level } else { "warn" };
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact()
        .with_filter(filter_for(console_level));

    tracing_subscriber::registry()
        .with(file_layer.with_filter(filter_for(level)))
        .with(console_layer)
        .init();

    tracing::info!(
        "logging initialized at level={level}, dir={}, json={json_output}",
        log_dir.display()
    );

    Ok(LogGuard { _guard: guard })
}

/// Initialize logging from the `[logging]` config section.
pub fn init_from_config(config: &LoggingConfig, log_dir: &Path, verbose: bool) -> FdResult<LogGuard> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    init_logging(level, log_dir, config.json_output, verbose)
}

/// Initialize a minimal console-only logger for tests or one-shot CLI usage.
///
/// Safe to call repeatedly; only the first call installs a subscriber.
pub fn init_console_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact()
                .with_filter(filter_for(level)),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_logging_is_reentrant() {
        init_console_logging("debug");
        init_console_logging("trace");
    }
}
