use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::core::config::AppConfig;

pub const LOG_FILE_PREFIX: &str = "kube-watcher.log";

/// Stdout plus a daily-rolling file under `log_dir`. `RUST_LOG` wins over the
/// configured level. Keep the returned guard alive or buffered file lines are
/// dropped on exit.
pub fn init_tracing(config: &AppConfig) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    guard
}
