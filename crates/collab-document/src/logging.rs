//! Process-wide diagnostic toggle
//!
//! Façade events go through [`tracing`] but are only emitted while the
//! toggle is on. It starts off and never affects results.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing_subscriber::{filter::ParseError, EnvFilter};

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Turn façade diagnostics on or off
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

/// Whether façade diagnostics are emitted
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Errors from [`init_tracing`]
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Filter directive did not parse
    #[error("Invalid log filter: {0}")]
    Filter(#[from] ParseError),

    /// Another global subscriber is already installed
    #[error("A global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Install a fmt subscriber filtered by `filter` and enable diagnostics
///
/// `filter` uses `RUST_LOG` syntax, e.g. `"collab_document=debug"`.
pub fn init_tracing(filter: &str) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(filter)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)?;
    set_enabled(true);
    Ok(())
}

/// Emit a tracing event at `$level` when the toggle is on
macro_rules! event {
    ($level:ident, $($arg:tt)+) => {
        if $crate::logging::is_enabled() {
            ::tracing::$level!($($arg)+);
        }
    };
}

pub(crate) use event;
