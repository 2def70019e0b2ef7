//! Tracing setup.
//!
//! Console output always goes to stderr, keeping stdout free for command
//! output. When `logging.dir` is set, a daily-rolling JSON log file is
//! written alongside. `RUST_LOG`, when set, replaces the configured filter.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "tackboard.log";

/// Filter directives for our own targets at `level`, everything else at warn.
pub fn filter_directives(level: &str) -> String {
    format!("warn,tackboard={level},tower_http={level}", level = level)
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directives(level)))
        .unwrap_or_else(|_| EnvFilter::new(filter_directives("info")))
}

/// Initialize the global subscriber.
///
/// Returns the file writer's guard when file logging is active; hold it for
/// the lifetime of the process so buffered lines get flushed.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = build_filter(&config.level);

    let console_plain = (!config.json).then(|| fmt::layer().with_writer(std::io::stderr));
    let console_json = config
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));

    let mut guard = None;
    let file_layer = match &config.dir {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
                let (writer, file_guard) = tracing_appender::non_blocking(appender);
                guard = Some(file_guard);
                Some(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(writer),
                )
            }
            Err(e) => {
                eprintln!("Failed to create log directory {}: {}", dir.display(), e);
                None
            }
        },
        None => None,
    };

    let file_logging = file_layer.is_some();
    if tracing_subscriber::registry()
        .with(filter)
        .with(console_plain)
        .with(console_json)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        // A subscriber is already installed (tests, embedding); keep it.
        return guard;
    }

    if file_logging && let Some(dir) = &config.dir {
        tracing::info!(log_dir = %dir.display(), "File logging enabled");
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert_eq!(
            filter_directives("debug"),
            "warn,tackboard=debug,tower_http=debug"
        );
    }

    #[test]
    fn test_build_filter_survives_bad_level() {
        // An unparseable level falls back instead of panicking
        let _ = build_filter("not a level!!");
    }

    #[test]
    fn test_init_logging_with_file_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let config = LoggingConfig {
            level: "debug".into(),
            dir: Some(log_dir.clone()),
            json: false,
        };
        let guard = init_logging(&config);
        assert!(guard.is_some());
        assert!(log_dir.is_dir());

        // A second init is harmless
        let _ = init_logging(&LoggingConfig::default());
    }
}
