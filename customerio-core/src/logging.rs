//! File logging for the CLI and other long-running callers
//!
//! Everything goes to a single file, [`Config::log_path`]
//! (`$XDG_STATE_HOME/customerio/customerio.log`). The file is appended to
//! and never rotated: one command run produces a handful of lines.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the background log writer alive; pending lines are flushed on drop.
pub struct LoggingGuard {
    path: PathBuf,
    _worker: tracing_appender::non_blocking::WorkerGuard,
}

impl LoggingGuard {
    /// File the subscriber writes to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Install a global subscriber writing to the log file.
///
/// `RUST_LOG` wins over `config.level`. An unparsable level is a config error.
/// If the host already installed a subscriber, that one stays in charge.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let path = Config::log_path();
    let (dir, file_name) = match (path.parent(), path.file_name().and_then(|n| n.to_str())) {
        (Some(dir), Some(name)) => (dir.to_path_buf(), name.to_string()),
        _ => {
            return Err(Error::Config(format!(
                "invalid log path {}",
                path.display()
            )))
        }
    };
    std::fs::create_dir_all(&dir)?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            Error::Config(format!("invalid logging.level {:?}: {}", config.level, e))
        })?,
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&dir)
        .map_err(|e| Error::Config(format!("cannot open {}: {}", path.display(), e)))?;
    let (writer, worker) = tracing_appender::non_blocking(appender);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .is_ok();

    tracing::info!(
        path = %path.display(),
        level = %config.level,
        installed,
        "file logging started"
    );

    Ok(LoggingGuard {
        path,
        _worker: worker,
    })
}

/// Subscriber for tests: output captured by the test harness.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
