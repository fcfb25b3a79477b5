//! Fare Ledger - transit point-of-sale ticket ledger
//!
//! # Overview
//!
//! - **Ledger** (`db`, `services::ledger`): reports and tickets in SQLite with
//!   aggregate counters kept in step with every ticket write
//! - **Reference cache** (`cache`): routes, users and daily counters in redb
//! - **Remote store** (`cloud`): authoritative routes and users behind HTTP
//! - **Sync** (`services::sync`): one-way full replacement of cached collections
//!
//! # Module layout
//!
//! ```text
//! fare-ledger/src/
//! ├── core/          # config, environment, application state
//! ├── db/            # pool, migrations, repositories, aggregate rules
//! ├── cache/         # redb reference cache
//! ├── cloud/         # remote store and connectivity probe
//! ├── services/      # ledger engine, sync engine, routes, users, counters
//! └── utils/         # logging
//! ```

pub mod cache;
pub mod cloud;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

pub use cache::ReferenceCache;
pub use cloud::{ConnectivityProbe, HttpConnectivityProbe, HttpRemoteStore, RemoteStore};
pub use core::{Config, LedgerApp, setup_environment};
pub use db::DbService;
pub use services::{CounterService, LedgerService, RouteService, SyncService, UserService};
pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};
