use std::fs::{self, File};
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{self, NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Keeps the background writer alive; drop it to flush pending events.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Install the global subscriber: JSON or plain text, to a file or stderr.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(logging: &LoggingConfig) -> Result<LoggingGuard> {
    let (writer, guard) = match &logging.file {
        Some(path) => {
            let file = open_log_file(path)?;
            non_blocking::NonBlockingBuilder::default()
                .lossy(false)
                .finish(file)
        }
        None => non_blocking::NonBlockingBuilder::default()
            .lossy(false)
            .finish(io::stderr()),
    };

    let level = logging.level().unwrap_or(Level::INFO);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if logging.structured {
        install_json(filter, writer);
    } else {
        install_plain(filter, writer);
    }

    Ok(LoggingGuard { _guard: guard })
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory at {}", parent.display()))?;
    }
    File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file at {}", path.display()))
}

fn install_json(filter: EnvFilter, writer: NonBlocking) {
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // Ignore error if a global subscriber is already set (e.g., when running in tests)
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn install_plain(filter: EnvFilter, writer: NonBlocking) {
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
