//! Core types and utilities for backup-hook.
//!
//! This crate provides the pieces shared by the webhook service and its client:
//!
//! - **Configuration**: `HookConfig`, parsed from the `key = value` backup config file
//! - **Secrets**: `Secret`, the shared HMAC key that never leaves the process
//! - **Signatures**: `sign` / `verify` for the `X-Signature` header
//! - **Wire types**: `BackupRequest`, `BackupResponse`, `ErrorResponse`
//!
//! # Signature scheme
//!
//! The caller computes `HMAC-SHA256(callback_secret, raw_body)` and sends it as
//! `X-Signature: sha256=<lowercase hex>`. The receiver verifies the exact bytes
//! it received, before any JSON decoding.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod secret;
pub mod signature;
pub mod wire;

pub use config::HookConfig;
pub use error::ConfigError;
pub use secret::Secret;
pub use signature::{sign, verify, SIGNATURE_HEADER, SIGNATURE_PREFIX};
pub use wire::{BackupRequest, BackupResponse, ErrorResponse};
