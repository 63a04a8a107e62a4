//! Logging setup, generalized from the teacher's `process_info!`/`init_tracing`
//! family: instead of a fixed set of process kinds, every actor node carries
//! its own name, which is attached to every log line as the `node` field.

use crate::errors::{SharedError, SharedResult};

/// Initialize the global `tracing` subscriber for a node process.
///
/// `log_level` follows `tracing`'s level names (`trace`, `debug`, `info`,
/// `warn`, `error`). `log_format` selects between a compact text formatter
/// (`"text"`, the default) and structured JSON lines (`"json"`), mirroring
/// the `LogLevel`/`LogFormat` pair on `NodeConfig`.
pub fn init_tracing(log_level: &str, log_format: &str) -> SharedResult<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_new(log_level)
        .map_err(|e| SharedError::LoggingInit(format!("invalid log level '{log_level}': {e}")))?;

    let result = match log_format {
        "json" => fmt().with_env_filter(env_filter).json().try_init(),
        _ => fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .try_init(),
    };

    // A subscriber may already be installed (e.g. in tests that share a
    // process); that is not a failure for our purposes.
    let _ = result;
    Ok(())
}

/// Macro for node-aware info logging.
#[macro_export]
macro_rules! node_info {
    ($node_name:expr, $($arg:tt)*) => {
        tracing::info!(node = %$node_name, $($arg)*)
    };
}

/// Macro for node-aware warning logging.
#[macro_export]
macro_rules! node_warn {
    ($node_name:expr, $($arg:tt)*) => {
        tracing::warn!(node = %$node_name, $($arg)*)
    };
}

/// Macro for node-aware error logging.
#[macro_export]
macro_rules! node_error {
    ($node_name:expr, $($arg:tt)*) => {
        tracing::error!(node = %$node_name, $($arg)*)
    };
}

/// Macro for node-aware debug logging.
#[macro_export]
macro_rules! node_debug {
    ($node_name:expr, $($arg:tt)*) => {
        tracing::debug!(node = %$node_name, $($arg)*)
    };
}
