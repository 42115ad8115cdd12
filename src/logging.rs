use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;

const LOG_FILE_PREFIX: &str = "restaurant-admin.log";

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Installs the global subscriber: stdout always, plus a daily rolling file
/// under `log_dir` when enabled. The returned guard flushes the file writer
/// and must live as long as the app.
pub fn init(config: &AppConfig, log_dir: &Path) -> std::io::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stdout);

    let (file_layer, guard) = if config.log_to_file {
        std::fs::create_dir_all(log_dir)?;
        let (writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE_PREFIX));
        let layer = fmt::layer()
            .with_timer(LocalTimer)
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    std::panic::set_hook(Box::new(|info| {
        tracing::error!(target: "panic", message = %info, "panic occurred");
    }));

    tracing::info!(path = %log_dir.display(), to_file = config.log_to_file, "Logging initialized");
    Ok(guard)
}
