//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and production environments
//! Features:
//! - Console output (pretty or JSON)
//! - Daily rotating application logs (deleted after 14 days)
//! - Permanent security logs (never deleted)

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Application logs older than this are removed
const APP_LOG_RETENTION_DAYS: i64 = 14;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Clean up old application log files (older than 14 days)
///
/// Security logs are never touched.
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<()> {
    use chrono::{Local, TimeZone};

    let cutoff = Local::now() - chrono::Duration::days(APP_LOG_RETENTION_DAYS);

    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(());
    }

    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        // app.YYYY-MM-DD
        let Some(date_part) = name.strip_prefix("app.") else {
            continue;
        };
        let Ok(naive_date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d") else {
            continue;
        };
        let expired = naive_date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| Local.from_local_datetime(&midnight).single())
            .is_some_and(|local| local < cutoff);

        if expired {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
        }
    }

    Ok(())
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn console_layer(level: &str, json_format: bool) -> BoxedLayer {
    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter(level))
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter(level))
            .boxed()
    }
}

/// File layer for one log stream, selected by target
fn file_layer(
    dir: PathBuf,
    prefix: &str,
    json_format: bool,
    security: bool,
) -> anyhow::Result<BoxedLayer> {
    fs::create_dir_all(&dir)?;
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, prefix);
    let select = tracing_subscriber::filter::filter_fn(move |meta| {
        (meta.target() == "security") == security
    });

    let layer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::sync::Mutex::new(appender))
            .with_filter(select)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(appender))
            .with_filter(select)
            .boxed()
    };
    Ok(layer)
}

/// Initialize the logging system with daily rotating logs
///
/// # Arguments
/// * `level` - Log level (e.g., "info", "debug", "warn"); `RUST_LOG` wins when set
/// * `json_format` - Whether to use JSON format (true for production, false for development)
/// * `log_dir` - Optional directory for file logging (e.g., Some("./data/logs"))
///
/// Must be called inside a tokio runtime when `log_dir` is set (cleanup task).
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let mut layers: Vec<BoxedLayer> = vec![console_layer(level, json_format)];

    if let Some(dir) = log_dir {
        let log_dir = Path::new(dir);
        layers.push(file_layer(log_dir.join("app"), "app", json_format, false)?);
        layers.push(file_layer(log_dir.join("security"), "security", json_format, true)?);

        tokio::spawn(periodic_cleanup(log_dir.to_path_buf()));
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(())
}

/// Periodic cleanup task - runs every hour to clean old logs
async fn periodic_cleanup(log_dir: PathBuf) {
    use tokio::time::{Duration, sleep};

    loop {
        sleep(Duration::from_secs(3600)).await;

        if let Err(e) = cleanup_old_logs(&log_dir) {
            tracing::error!(error = %e, "Failed to cleanup old logs");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_removes_only_expired_app_logs() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        fs::create_dir_all(&app).unwrap();

        let old = app.join("app.2000-01-01");
        let today = app.join(format!("app.{}", chrono::Local::now().format("%Y-%m-%d")));
        let other = app.join("notes.txt");
        for file in [&old, &today, &other] {
            fs::write(file, "x").unwrap();
        }

        cleanup_old_logs(dir.path()).unwrap();

        assert!(!old.exists());
        assert!(today.exists());
        assert!(other.exists());
    }

    #[test]
    fn test_cleanup_without_app_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cleanup_old_logs(dir.path()).is_ok());
    }
}
