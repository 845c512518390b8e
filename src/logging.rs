//! Tracing setup for the CLI.
//!
//! Commands print tables on stdout, so a normal run logs to a daily file
//! under the local data directory. `--verbose` sends the events to stderr
//! instead, one level more detailed. `RUST_LOG` overrides either default.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

const FILE_FILTER: &str = "trackops=info,warn";
const VERBOSE_FILTER: &str = "trackops=debug,info";
const LOG_FILE: &str = "trackops.log";

/// Where a run's log events go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Daily rolling `trackops.log` in this directory.
    File(PathBuf),
    Stderr,
}

impl LogTarget {
    pub fn for_run(verbose: bool) -> anyhow::Result<Self> {
        if verbose {
            Ok(LogTarget::Stderr)
        } else {
            log_directory().map(LogTarget::File)
        }
    }

    fn default_filter(&self) -> &'static str {
        match self {
            LogTarget::File(_) => FILE_FILTER,
            LogTarget::Stderr => VERBOSE_FILTER,
        }
    }
}

/// Install the global subscriber for this run.
///
/// # Errors
///
/// Fails when the log directory cannot be found or created, or when a
/// subscriber is already installed.
pub fn init(verbose: bool) -> anyhow::Result<LogTarget> {
    let target = LogTarget::for_run(verbose)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(target.default_filter()));

    match &target {
        LogTarget::File(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE);
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(appender)
                        .with_ansi(false)
                        .with_line_number(true),
                )
                .try_init()?;
        }
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr).without_time().compact())
                .try_init()?;
        }
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), ?target, "Logging ready");
    Ok(target)
}

/// `<data_local_dir>/trackops/logs`.
pub fn log_directory() -> anyhow::Result<PathBuf> {
    dirs::data_local_dir()
        .map(|base| base.join("trackops").join("logs"))
        .context("Could not determine local data directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_logs_to_stderr() {
        let target = LogTarget::for_run(true).unwrap();
        assert_eq!(target, LogTarget::Stderr);
        assert_eq!(target.default_filter(), "trackops=debug,info");
    }

    #[test]
    fn test_quiet_run_logs_to_file() {
        let target = LogTarget::for_run(false).unwrap();
        match &target {
            LogTarget::File(dir) => assert!(dir.ends_with("trackops/logs")),
            LogTarget::Stderr => panic!("expected a file target"),
        }
        assert_eq!(target.default_filter(), "trackops=info,warn");
    }
}
