//! Error types for backup-hook configuration.

use std::path::PathBuf;

/// Errors that can occur while loading the hook configuration.
///
/// Any of these is fatal: the service refuses to start without a valid config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// `callback_secret` is absent or empty.
    #[error("callback_secret not found in config file")]
    MissingSecret,

    /// A recognized key carries a value that does not parse.
    #[error("invalid value for {key} on line {line}: {reason}")]
    InvalidValue {
        /// The config key.
        key: &'static str,
        /// 1-based line number.
        line: usize,
        /// Why the value was rejected.
        reason: String,
    },
}
