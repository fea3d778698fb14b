//! JSON bodies exchanged on `POST /backup`.

use serde::{Deserialize, Serialize};

/// Request envelope sent by the caller.
///
/// `args` may be omitted or `null`; both mean "no extra arguments". Order is
/// preserved and becomes the script's argv order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRequest {
    /// Arguments forwarded to the backup script.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub args: Vec<String>,
}

impl BackupRequest {
    /// Build a request from any iterable of string-like arguments.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupResponse {
    /// Human-readable status message.
    pub message: String,
    /// Combined stdout/stderr of the backup script.
    pub output: String,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
