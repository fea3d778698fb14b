//! Hook configuration.
//!
//! The configuration lives in the same `key = value` file the backup script
//! sources, so unknown keys are ignored and values may carry shell quotes.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::secret::Secret;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 47731;

/// Default backup script, relative to the working directory.
pub const DEFAULT_SCRIPT_PATH: &str = "docker-backup.sh";

/// Default interpreter the script is handed to.
pub const DEFAULT_INTERPRETER: &str = "/bin/bash";

/// Default upper bound on a single script run.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Default maximum accepted request body (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default ceiling on simultaneous script runs.
pub const DEFAULT_MAX_CONCURRENT_BACKUPS: usize = 16;

/// Immutable, process-wide configuration for the webhook receiver.
#[derive(Debug, Clone)]
pub struct HookConfig {
    /// Port to listen on (`port`, default 47731).
    pub port: u16,

    /// Address to bind (`bind_address`, default 0.0.0.0).
    pub bind_address: IpAddr,

    /// Backup script path (`script_path`, default `docker-backup.sh`).
    pub script_path: PathBuf,

    /// Interpreter for the script (`interpreter`, default `/bin/bash`).
    /// `None` executes the script directly.
    pub interpreter: Option<PathBuf>,

    /// Working directory for every script run (`working_dir`, default `.`).
    pub working_dir: PathBuf,

    /// Upper bound on a single run (`script_timeout_secs`, default 3600).
    pub script_timeout: Duration,

    /// Maximum request body size in bytes (`max_body_bytes`, default 1 MiB).
    pub max_body_bytes: usize,

    /// Maximum simultaneous script runs (`max_concurrent_backups`, default 16).
    pub max_concurrent_backups: usize,

    /// Shared HMAC secret (`callback_secret`, required).
    pub secret: Secret,
}

impl HookConfig {
    /// Create a configuration with default settings around `secret`.
    #[must_use]
    pub fn new(secret: Secret) -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            script_path: PathBuf::from(DEFAULT_SCRIPT_PATH),
            interpreter: Some(PathBuf::from(DEFAULT_INTERPRETER)),
            working_dir: PathBuf::from("."),
            script_timeout: DEFAULT_SCRIPT_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_concurrent_backups: DEFAULT_MAX_CONCURRENT_BACKUPS,
            secret,
        }
    }

    /// Set the script path.
    #[must_use]
    pub fn with_script_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.script_path = path.into();
        self
    }

    /// Set the interpreter; `None` runs the script directly.
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: Option<PathBuf>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Set the script timeout.
    #[must_use]
    pub fn with_script_timeout(mut self, timeout: Duration) -> Self {
        self.script_timeout = timeout;
        self
    }

    /// Set the ceiling on concurrent script runs.
    #[must_use]
    pub fn with_max_concurrent_backups(mut self, max: usize) -> Self {
        self.max_concurrent_backups = max;
        self
    }

    /// Socket address the service listens on.
    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Read and parse the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or any error
    /// from [`HookConfig::parse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse config file contents.
    ///
    /// Blank lines, `#` comments and lines without `=` are skipped. When a key
    /// repeats, the last occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] when no non-empty
    /// `callback_secret` is present, or [`ConfigError::InvalidValue`] for a
    /// recognized key with an unparsable value.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut config = Self::new(Secret::new(Vec::new()));

        for (index, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(value.trim());
            let line = index + 1;

            match key.trim() {
                "callback_secret" => config.secret = Secret::from(value),
                "port" => config.port = parse_value("port", line, value)?,
                "bind_address" => config.bind_address = parse_value("bind_address", line, value)?,
                "script_path" => config.script_path = PathBuf::from(value),
                "interpreter" => {
                    config.interpreter = (!value.is_empty()).then(|| PathBuf::from(value));
                }
                "working_dir" => config.working_dir = PathBuf::from(value),
                "script_timeout_secs" => {
                    let secs: u64 = parse_nonzero("script_timeout_secs", line, value)?;
                    config.script_timeout = Duration::from_secs(secs);
                }
                "max_body_bytes" => {
                    config.max_body_bytes = parse_value("max_body_bytes", line, value)?;
                }
                "max_concurrent_backups" => {
                    config.max_concurrent_backups =
                        parse_nonzero("max_concurrent_backups", line, value)?;
                }
                _ => {}
            }
        }

        if config.secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        Ok(config)
    }
}

/// Strip one layer of matching single or double quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn parse_value<T>(key: &'static str, line: usize, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        line,
        reason: e.to_string(),
    })
}

fn parse_nonzero<T>(key: &'static str, line: usize, value: &str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    let parsed: T = parse_value(key, line, value)?;
    if parsed == T::default() {
        return Err(ConfigError::InvalidValue {
            key,
            line,
            reason: "must be greater than zero".into(),
        });
    }
    Ok(parsed)
}
