//! Backup hook client SDK.
//!
//! Signs and sends trigger requests to a backup-hook service.
//!
//! # Example
//!
//! ```no_run
//! use backup_hook_client::BackupHookClient;
//! use backup_hook_core::Secret;
//!
//! # async fn example() -> Result<(), backup_hook_client::ClientError> {
//! let client = BackupHookClient::new(
//!     "http://localhost:47731",
//!     Secret::from("shared-callback-secret"),
//! )?;
//!
//! let response = client.trigger(["nightly", "--prune"]).await?;
//! println!("{}\n{}", response.message, response.output);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;

pub use client::{BackupHookClient, ClientOptions};
pub use error::ClientError;
