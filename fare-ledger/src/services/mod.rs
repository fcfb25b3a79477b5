//! Service layer
//!
//! - [`LedgerService`] - report lifecycle, ticket issuance and nullification
//! - [`SyncService`] - remote to local reference data replication
//! - [`RouteService`] / [`UserService`] - reference data reads and remote writes
//! - [`CounterService`] - daily UI counters

pub mod counter;
pub mod ledger;
pub mod route;
pub mod sync;
pub mod user;

pub use counter::CounterService;
pub use ledger::LedgerService;
pub use route::RouteService;
pub use sync::SyncService;
pub use user::UserService;
