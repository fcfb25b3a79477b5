//! Shared types for the fare ledger
//!
//! Domain models, the unified error type and time helpers used by the
//! ledger engine and its callers.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
