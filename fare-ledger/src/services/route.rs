//! Route Service - reads from the local cache, writes through the remote store

use super::SyncService;
use crate::cache::ReferenceCache;
use crate::cloud::{ConnectivityProbe, RemoteStore, require_connectivity};
use shared::error::{AppError, AppResult};
use shared::models::{CollectionKind, Route};
use std::sync::Arc;

pub struct RouteService {
    cache: ReferenceCache,
    remote: Arc<dyn RemoteStore>,
    probe: Arc<dyn ConnectivityProbe>,
    sync: Arc<SyncService>,
}

impl RouteService {
    pub fn new(
        cache: ReferenceCache,
        remote: Arc<dyn RemoteStore>,
        probe: Arc<dyn ConnectivityProbe>,
        sync: Arc<SyncService>,
    ) -> Self {
        Self {
            cache,
            remote,
            probe,
            sync,
        }
    }

    pub fn list_routes(&self) -> AppResult<Vec<Route>> {
        Ok(self.cache.routes().all()?)
    }

    pub fn find_route(&self, id: &str) -> AppResult<Route> {
        self.cache
            .routes()
            .find(id)?
            .ok_or_else(|| AppError::not_found(format!("Route {id}")))
    }

    /// Create a route remotely, then refresh the cache. Assigns an id when blank.
    pub async fn create_route(&self, mut route: Route) -> AppResult<Route> {
        if route.id.trim().is_empty() {
            route.id = uuid::Uuid::new_v4().to_string();
        }
        validate(&route)?;
        require_connectivity(self.probe.as_ref()).await?;

        self.remote
            .insert_one(CollectionKind::Routes, to_document(&route)?)
            .await
            .inspect_err(|e| tracing::error!(route_id = %route.id, error = %e, "Failed to create remote route"))?;
        tracing::info!(route_id = %route.id, "Route created");

        self.sync.sync_collection(CollectionKind::Routes).await?;
        Ok(route)
    }

    pub async fn update_route(&self, route: Route) -> AppResult<Route> {
        if route.id.trim().is_empty() {
            return Err(AppError::validation("Route id is required").with_detail("field", "id"));
        }
        validate(&route)?;
        require_connectivity(self.probe.as_ref()).await?;

        self.remote
            .update_one(CollectionKind::Routes, &route.id, to_document(&route)?)
            .await
            .inspect_err(|e| tracing::error!(route_id = %route.id, error = %e, "Failed to update remote route"))?;
        tracing::info!(route_id = %route.id, "Route updated");

        self.sync.sync_collection(CollectionKind::Routes).await?;
        Ok(route)
    }

    pub async fn delete_route(&self, id: &str) -> AppResult<()> {
        require_connectivity(self.probe.as_ref()).await?;

        self.remote
            .delete_one(CollectionKind::Routes, id)
            .await
            .inspect_err(|e| tracing::error!(route_id = %id, error = %e, "Failed to delete remote route"))?;
        tracing::info!(route_id = %id, "Route deleted");

        self.sync.sync_collection(CollectionKind::Routes).await?;
        Ok(())
    }
}

/// Refuse routes a sync would reject anyway
fn validate(route: &Route) -> AppResult<()> {
    if route.is_empty() {
        tracing::warn!(route_id = %route.id, "Rejected incomplete route");
        return Err(AppError::validation(
            "Route needs a departure, a destination, stops and both timetables",
        )
        .with_detail("route_id", route.id.clone()));
    }
    Ok(())
}

fn to_document(route: &Route) -> AppResult<serde_json::Value> {
    serde_json::to_value(route).map_err(|e| AppError::internal(format!("Failed to encode route: {e}")))
}
