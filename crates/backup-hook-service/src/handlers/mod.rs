//! API handlers.

pub mod backup;
pub mod health;
