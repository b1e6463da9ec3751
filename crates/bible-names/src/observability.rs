//! Logging and tracing setup for the CLI.
//!
//! Human-readable events go to stderr so stdout stays clean for command
//! output. When a log directory can be determined, events are also written
//! as JSON lines to a daily-rolling file through a non-blocking writer.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "bible-names.jsonl";

/// Where file logs go.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// Directory for rolling log files.
    pub log_dir: Option<PathBuf>,
    /// File name prefix inside `log_dir`.
    pub file_prefix: String,
}

impl ObservabilityConfig {
    /// Resolve the log location.
    ///
    /// `BIBLE_NAMES_LOG_PATH` wins, then `BIBLE_NAMES_LOG_DIR`, then the
    /// configured directory, then `<data local dir>/logs`.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        if let Some(path) = std::env::var_os("BIBLE_NAMES_LOG_PATH").map(PathBuf::from)
            && let Some(name) = path.file_name()
        {
            return Self {
                log_dir: path.parent().map(PathBuf::from),
                file_prefix: name.to_string_lossy().into_owned(),
            };
        }
        let log_dir = std::env::var_os("BIBLE_NAMES_LOG_DIR")
            .map(PathBuf::from)
            .or(config_log_dir)
            .or_else(|| {
                bible_names_core::config::user_data_local_dir()
                    .map(|dir| dir.join("logs").into_std_path_buf())
            });
        Self {
            log_dir,
            file_prefix: LOG_FILE_PREFIX.to_string(),
        }
    }
}

/// Build the event filter.
///
/// `RUST_LOG` wins when set. Otherwise `-q` means errors only, `-v` debug,
/// `-vv` trace, and no flag the configured level.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if std::env::var_os("RUST_LOG").is_some()
        && let Ok(filter) = EnvFilter::try_from_default_env()
    {
        return filter;
    }
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => default_level,
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    EnvFilter::new(level)
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the whole process.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .compact()
        .with_target(false)
        .without_time();

    let mut guard = None;
    let mut file_error = None;
    let file_layer = match config.log_dir {
        Some(ref dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
                let (writer, worker_guard) = tracing_appender::non_blocking(appender);
                guard = Some(worker_guard);
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .json()
                        .with_file(true)
                        .with_line_number(true)
                        .with_target(true),
                )
            }
            Err(e) => {
                file_error = Some((dir.clone(), e));
                None
            }
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    if let Some((dir, e)) = file_error {
        tracing::warn!(dir = %dir.display(), error = %e, "cannot create log directory; file logging disabled");
    }
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn quiet_beats_verbose() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let hint = |f: EnvFilter| f.max_level_hint();
        assert_eq!(hint(env_filter(true, 2, "info")), Some(LevelFilter::ERROR));
        assert_eq!(hint(env_filter(false, 0, "warn")), Some(LevelFilter::WARN));
        assert_eq!(hint(env_filter(false, 1, "info")), Some(LevelFilter::DEBUG));
        assert_eq!(hint(env_filter(false, 3, "info")), Some(LevelFilter::TRACE));
    }

    #[test]
    fn config_dir_used_when_env_unset() {
        if std::env::var_os("BIBLE_NAMES_LOG_PATH").is_some()
            || std::env::var_os("BIBLE_NAMES_LOG_DIR").is_some()
        {
            return;
        }
        let config = ObservabilityConfig::from_env_with_overrides(Some(PathBuf::from("/tmp/bn-logs")));
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/bn-logs")));
        assert_eq!(config.file_prefix, LOG_FILE_PREFIX);
    }
}
