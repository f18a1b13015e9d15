//! Tracing setup for the console binary
//!
//! Logs go to stderr by default, or to `<logs>/recap.log` with `--log-file`
//! (platform data dir, see `PathManager::log_file_path`).

use config::PathManager;
use std::fs::OpenOptions;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info,recap_core=debug";
const VERBOSE_FILTER: &str = "debug,recap_core=trace,llm=trace";

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
    })
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the lifetime of the process.
pub fn init_logging(to_file: bool, verbose: bool) -> Option<WorkerGuard> {
    if to_file {
        match open_log_file() {
            Ok((file, path)) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                let subscriber = tracing_subscriber::registry().with(env_filter(verbose)).with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                );
                if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
                    eprintln!("[recap] Failed to set tracing subscriber: {}", e);
                    return None;
                }
                tracing::info!("Logging initialized, writing to {:?}", path);
                return Some(guard);
            }
            Err(e) => eprintln!("[recap] {}, logging to stderr", e),
        }
    }

    init_stderr_logging(verbose);
    None
}

fn open_log_file() -> Result<(std::fs::File, std::path::PathBuf), String> {
    let path = PathManager::log_file_path().ok_or("No log path configured")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create log directory {:?}: {}", parent, e))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("Failed to open log file {:?}: {}", path, e))?;
    Ok((file, path))
}

fn init_stderr_logging(verbose: bool) {
    let subscriber = tracing_subscriber::registry().with(env_filter(verbose)).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true),
    );

    let _ = tracing::subscriber::set_global_default(subscriber);
}
