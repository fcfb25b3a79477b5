//! Data models
//!
//! Ledger row types derive `sqlx::FromRow` behind the `db` feature.
//! Ledger ids are `i64` (SQLite INTEGER PRIMARY KEY); reference data is
//! keyed by string.

pub mod count;
pub mod report;
pub mod route;
pub mod sync;
pub mod ticket;
pub mod user;

// Re-exports
pub use count::*;
pub use report::*;
pub use route::*;
pub use sync::*;
pub use ticket::*;
pub use user::*;
