//! Tracing setup for the server and the CLI

use crate::error::WranglerError;
use std::fs::File;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "embedwrangler.log";

/// Dependencies that are held at `warn` unless `RUST_LOG` says otherwise
const NOISY_TARGETS: &[&str] = &["actix_server", "hyper", "reqwest", "mio"];

/// Console plus append-only file logging, used by `serve`
///
/// `RUST_LOG` replaces the directives built from `log_level`.
pub fn setup_logging(log_dir: &Path, log_level: &str) -> Result<(), WranglerError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);
    let log_file = open_log_file(&log_file_path)?;
    let level = parse_log_level(log_level);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(env_filter(level));

    let file_layer = fmt::layer()
        .with_writer(log_file)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(env_filter(level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| WranglerError::config(format!("Failed to install logger: {}", e)))?;

    tracing::info!(
        "Logging to console and {} (level={})",
        log_file_path.display(),
        level
    );

    Ok(())
}

/// Console-only logging, used by one-shot commands such as `check`
pub fn setup_console_logging(log_level: &str) -> Result<(), WranglerError> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(env_filter(parse_log_level(log_level)))
        .try_init()
        .map_err(|e| WranglerError::config(format!("Failed to install logger: {}", e)))
}

/// Open `path` for appending, creating its directory when needed
fn open_log_file(path: &Path) -> Result<File, WranglerError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| {
            WranglerError::config(format!(
                "Failed to create log directory {}: {}",
                dir.display(),
                e
            ))
        })?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            WranglerError::config(format!("Failed to open log file {}: {}", path.display(), e))
        })
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// `level` for our crates; dependencies never go below `warn`
fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    let quiet = if level == "error" { "error" } else { "warn" };

    std::iter::once(level)
        .chain(NOISY_TARGETS.iter().map(|target| format!("{}={}", target, quiet)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse string to tracing Level
pub fn parse_log_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to INFO", level);
            Level::INFO
        }
    }
}
