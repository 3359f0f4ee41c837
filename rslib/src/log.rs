use std::fs::OpenOptions;

use once_cell::sync::OnceCell;
use tracing::subscriber::set_global_default;
use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::error::OrInvalid;
use crate::error::Result;

const DEFAULT_FILTER: &str = "info";

static APPENDER_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Install the process-wide tracing subscriber. Output goes to stderr, and if
/// a path is provided, is also appended to that file. The filter is read from
/// `RUST_LOG`, falling back to `info`.
///
/// Only the first call has any effect.
pub fn set_global_logger(path: Option<&str>) -> Result<()> {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_try_init(|| -> Result<()> {
        let file_writer = match path {
            Some(path) => Some(
                fmt::layer()
                    .with_writer(get_appender(path)?)
                    .with_target(false)
                    .with_ansi(false),
            ),
            None => None,
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let subscriber = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(file_writer)
            .with(filter);
        set_global_default(subscriber).or_invalid("global subscriber already set")?;
        Ok(())
    })?;
    Ok(())
}

fn get_appender(path: &str) -> Result<NonBlocking> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let (appender, guard) = tracing_appender::non_blocking(file);
    if APPENDER_GUARD.set(guard).is_err() {
        crate::invalid_input!("log file should be set only once");
    }
    Ok(appender)
}
