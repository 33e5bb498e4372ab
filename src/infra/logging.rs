//! Usage: tracing subscriber setup (console + optional daily-rolling file).

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "info";
const LOG_FILE_PREFIX: &str = "api-session-client.log";

static INITIALIZED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Filter directive used when `RUST_LOG` is unset (defaults to `info`).
    pub default_filter: Option<String>,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub log_dir: Option<PathBuf>,
}

/// Install the global subscriber. Later calls are no-ops and return `None`.
///
/// Keep the returned guard alive for as long as file logging should flush.
pub fn init(options: LoggingOptions) -> Option<WorkerGuard> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return None;
    }

    let _ = tracing_log::LogTracer::init();

    let default_filter = options
        .default_filter
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string();
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_layer = fmt::layer().with_target(true).boxed();

    let (file_layer, guard) = match options.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("tracing subscriber already installed: {err}");
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let _guard = init(LoggingOptions {
            default_filter: Some("debug".to_string()),
            log_dir: Some(dir.path().to_path_buf()),
        });
        assert!(init(LoggingOptions::default()).is_none());
        tracing::info!("logging initialized");
    }
}
