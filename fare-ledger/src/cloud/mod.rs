//! Remote authoritative store and connectivity checks
//!
//! - [`RemoteStore`] - source of truth for routes and users
//! - [`ConnectivityProbe`] - best-effort reachability check before any remote call

mod connectivity;
mod http;

pub use connectivity::{ConnectivityProbe, HttpConnectivityProbe};
pub use http::HttpRemoteStore;

use async_trait::async_trait;
use serde_json::Value;
use shared::error::{AppError, AppResult};
use shared::models::CollectionKind;

/// Remote document database holding the authoritative collections
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every document of a collection
    async fn find_all(&self, kind: CollectionKind) -> AppResult<Vec<Value>>;

    async fn insert_one(&self, kind: CollectionKind, doc: Value) -> AppResult<()>;

    async fn update_one(&self, kind: CollectionKind, id: &str, doc: Value) -> AppResult<()>;

    async fn delete_one(&self, kind: CollectionKind, id: &str) -> AppResult<()>;
}

/// Fail fast with `NoConnectivity` when the probe cannot reach the network
pub async fn require_connectivity(probe: &dyn ConnectivityProbe) -> AppResult<()> {
    if probe.is_reachable().await {
        Ok(())
    } else {
        tracing::warn!("No internet connectivity, remote operation skipped");
        Err(AppError::no_connectivity())
    }
}
