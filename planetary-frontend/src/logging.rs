use std::{
    fs,
    path::Path,
    time::{Duration, SystemTime},
};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const MAX_LOG_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 3);
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Keeps the file writer flushing until dropped
#[allow(dead_code)]
pub struct LoggerGuard(Option<WorkerGuard>);

/// Console logging, plus daily-rotated files when `log_dir` is set
pub fn init_logging(log_dir: Option<&Path>, prefix: &str, level: &str) -> anyhow::Result<LoggerGuard> {
    let effective = effective_level(level);
    let builder = EnvFilter::builder().with_default_directive(effective.parse()?);
    let rust_log = std::env::var("RUST_LOG").unwrap_or_default();
    let console_filter = builder.clone().parse_lossy(&rust_log);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_filter(console_filter);

    let (file_layer, guard) = match log_dir {
        Some(log_dir) => {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(prefix)
                .filename_suffix("log")
                .build(log_dir)?;
            let (non_blocking, guard) = NonBlocking::new(file_appender);

            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(builder.parse_lossy(&rust_log));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    if effective != level {
        tracing::warn!("Invalid log level '{}', defaulting to '{}'", level, effective);
    }

    if let Some(log_dir) = log_dir {
        match cleanup_old_logs(log_dir, prefix, MAX_LOG_AGE) {
            Ok(0) => {}
            Ok(n) => tracing::info!("Deleted {} old log files", n),
            Err(e) => tracing::warn!("Failed to delete old log file: {}", e),
        }
    }

    Ok(LoggerGuard(guard))
}

/// Falls back to "info" for anything that is not a known level name
fn effective_level(level: &str) -> &str {
    if LEVELS.contains(&level) { level } else { "info" }
}

/// Remove `<prefix>*.log` files older than `max_age`
pub fn cleanup_old_logs(log_dir: &Path, prefix: &str, max_age: Duration) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let mut deleted = 0;

    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
            if file_name.starts_with(prefix) && file_name.ends_with(".log") {
                let metadata = fs::metadata(&path)?;
                if let Ok(modified) = metadata.modified() {
                    if now.duration_since(modified).unwrap_or_default() > max_age {
                        fs::remove_file(&path)?;
                        tracing::debug!("Old log file deleted: {}", file_name);
                        deleted += 1;
                    }
                }
            }
        }
    }

    Ok(deleted)
}
