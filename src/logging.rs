//! Run log handed to the components that report failures
//!
//! Each component holds its own [`Logger`] instead of emitting through a
//! process-wide subscriber. A logger wraps a `tracing` dispatcher, so events
//! are formatted by `tracing-subscriber` as `timestamp LEVEL message`.

use anyhow::Context;
use std::fmt::Display;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::{dispatcher, Dispatch, Level};
use tracing_subscriber::fmt::MakeWriter;

/// Cheaply cloneable handle to a log destination
#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    /// Append to the file at `path`, creating it if needed
    pub fn to_file<P: AsRef<Path>>(path: P, level: Level) -> crate::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        Ok(Self::to_writer(Mutex::new(file), level))
    }

    /// Send events to any `tracing-subscriber` writer
    pub fn to_writer<W>(writer: W, level: Level) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .with_max_level(level)
            .finish();

        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Drop every event
    pub fn disabled() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    pub fn error(&self, message: impl Display) {
        dispatcher::with_default(&self.dispatch, || tracing::error!("{}", message));
    }

    pub fn warn(&self, message: impl Display) {
        dispatcher::with_default(&self.dispatch, || tracing::warn!("{}", message));
    }

    pub fn info(&self, message: impl Display) {
        dispatcher::with_default(&self.dispatch, || tracing::info!("{}", message));
    }

    pub fn debug(&self, message: impl Display) {
        dispatcher::with_default(&self.dispatch, || tracing::debug!("{}", message));
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Empty the log file at the start of a run
pub fn truncate_log<P: AsRef<Path>>(path: P) -> crate::Result<()> {
    let path = path.as_ref();
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("Failed to reset log file {}", path.display()))?;
    Ok(())
}
