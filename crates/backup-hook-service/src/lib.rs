//! Backup hook HTTP service.
//!
//! A single-endpoint webhook receiver: `POST /backup` requests signed with the
//! shared callback secret trigger the backup script with the arguments from
//! the request body, and the script's combined output is returned.
//!
//! # Pipeline
//!
//! 1. Method check (`POST` only)
//! 2. Body buffered up to `max_body_bytes`
//! 3. `X-Signature` verified over the raw bytes
//! 4. Body decoded into `{"args": [...]}`
//! 5. Script run with those arguments, bounded by `script_timeout`
//!
//! Any failing step answers with a JSON `{"error": "..."}` body.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers must be async for axum

pub mod error;
pub mod handlers;
pub mod routes;
pub mod runner;
pub mod state;
pub mod validate;

pub use error::{ApiError, AuthError};
pub use routes::create_router;
pub use runner::{ProcessRunner, RunError, ScriptOutput, ScriptRunner};
pub use state::AppState;
