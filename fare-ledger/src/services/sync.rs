//! Sync Service - one-way refresh of the local reference cache
//!
//! The remote store is authoritative: a sync fetches the whole collection and
//! replaces the cached copy in one write transaction. Nothing is merged.

use crate::cache::ReferenceCache;
use crate::cloud::{ConnectivityProbe, RemoteStore, require_connectivity};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::error::{AppError, AppResult};
use shared::models::{CollectionKind, Route, SyncSummary, User};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub struct SyncService {
    cache: ReferenceCache,
    remote: Arc<dyn RemoteStore>,
    probe: Arc<dyn ConnectivityProbe>,
    /// Serialises syncs so two replacements never interleave
    lock: Mutex<()>,
    shutdown: CancellationToken,
}

impl SyncService {
    pub fn new(
        cache: ReferenceCache,
        remote: Arc<dyn RemoteStore>,
        probe: Arc<dyn ConnectivityProbe>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            cache,
            remote,
            probe,
            lock: Mutex::new(()),
            shutdown,
        }
    }

    /// Replace the cached copy of `kind` with the remote collection.
    ///
    /// Invalid remote data aborts the whole sync and leaves the cache as it was.
    pub async fn sync_collection(&self, kind: CollectionKind) -> AppResult<SyncSummary> {
        let _guard = self.lock.lock().await;

        if self.shutdown.is_cancelled() {
            tracing::warn!(collection = %kind, "Sync skipped after shutdown");
            return Err(AppError::cancelled());
        }

        require_connectivity(self.probe.as_ref()).await?;

        let docs = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                tracing::warn!(collection = %kind, "Sync cancelled during fetch");
                return Err(AppError::cancelled());
            }
            result = self.remote.find_all(kind) => result.inspect_err(|e| {
                tracing::error!(collection = %kind, error = %e, "Failed to fetch remote collection");
            })?,
        };

        let count = match kind {
            CollectionKind::Routes => {
                let routes: Vec<Route> = decode(kind, docs)?;
                if let Some(bad) = routes.iter().find(|r| r.is_empty()) {
                    tracing::warn!(collection = %kind, route_id = %bad.id, "Remote route is empty, sync rejected");
                    return Err(AppError::empty_data(format!("Route {} is incomplete", bad.id))
                        .with_detail("route_id", bad.id.clone()));
                }
                ensure_unique_keys(kind, routes.iter().map(|r| r.id.as_str()))?;
                self.cache.routes().replace(&routes).map_err(|e| {
                    tracing::error!(collection = %kind, error = %e, "Failed to replace cached routes");
                    AppError::from(e)
                })?;
                routes.len()
            }
            CollectionKind::Users => {
                let users: Vec<User> = decode(kind, docs)?;
                if users.iter().any(|u| u.username.trim().is_empty()) {
                    tracing::warn!(collection = %kind, "Remote user without username, sync rejected");
                    return Err(AppError::empty_data("User without username"));
                }
                ensure_unique_keys(kind, users.iter().map(|u| u.username.as_str()))?;
                self.cache.users().replace(&users).map_err(|e| {
                    tracing::error!(collection = %kind, error = %e, "Failed to replace cached users");
                    AppError::from(e)
                })?;
                users.len()
            }
        };

        tracing::info!(collection = %kind, count, "Collection synced");
        Ok(SyncSummary {
            collection: kind,
            count,
        })
    }

    /// Routes first, then users. Stops at the first failure.
    pub async fn sync_all(&self) -> AppResult<Vec<SyncSummary>> {
        let mut summaries = Vec::with_capacity(2);
        for kind in [CollectionKind::Routes, CollectionKind::Users] {
            summaries.push(self.sync_collection(kind).await?);
        }
        Ok(summaries)
    }
}

/// Every document is cached under its key, so a blank or repeated key
/// would silently drop documents from the replacement set
fn ensure_unique_keys<'a>(
    kind: CollectionKind,
    keys: impl Iterator<Item = &'a str>,
) -> AppResult<()> {
    let mut seen = HashSet::new();
    for key in keys {
        if key.trim().is_empty() {
            tracing::warn!(collection = %kind, "Remote document without key, sync rejected");
            return Err(AppError::empty_data(format!("{kind} document without key")));
        }
        if !seen.insert(key) {
            tracing::warn!(collection = %kind, key, "Duplicate remote key, sync rejected");
            return Err(AppError::empty_data(format!("Duplicate {kind} key {key}"))
                .with_detail("key", key));
        }
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(kind: CollectionKind, docs: Vec<Value>) -> AppResult<Vec<T>> {
    docs.into_iter()
        .enumerate()
        .map(|(index, doc)| {
            serde_json::from_value(doc).map_err(|e| {
                tracing::warn!(collection = %kind, index, error = %e, "Malformed remote document");
                AppError::empty_data(format!("Malformed {kind} document at index {index}: {e}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::route;
    use async_trait::async_trait;
    use serde_json::json;
    use shared::error::ErrorCode;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FixedRemote {
        routes: Vec<Value>,
        users: Vec<Value>,
    }

    #[async_trait]
    impl RemoteStore for FixedRemote {
        async fn find_all(&self, kind: CollectionKind) -> AppResult<Vec<Value>> {
            Ok(match kind {
                CollectionKind::Routes => self.routes.clone(),
                CollectionKind::Users => self.users.clone(),
            })
        }
        async fn insert_one(&self, _: CollectionKind, _: Value) -> AppResult<()> {
            Ok(())
        }
        async fn update_one(&self, _: CollectionKind, _: &str, _: Value) -> AppResult<()> {
            Ok(())
        }
        async fn delete_one(&self, _: CollectionKind, _: &str) -> AppResult<()> {
            Ok(())
        }
    }

    /// Never answers
    struct HangingRemote;

    #[async_trait]
    impl RemoteStore for HangingRemote {
        async fn find_all(&self, _: CollectionKind) -> AppResult<Vec<Value>> {
            std::future::pending().await
        }
        async fn insert_one(&self, _: CollectionKind, _: Value) -> AppResult<()> {
            Ok(())
        }
        async fn update_one(&self, _: CollectionKind, _: &str, _: Value) -> AppResult<()> {
            Ok(())
        }
        async fn delete_one(&self, _: CollectionKind, _: &str) -> AppResult<()> {
            Ok(())
        }
    }

    struct Probe(AtomicBool);

    #[async_trait]
    impl ConnectivityProbe for Probe {
        async fn is_reachable(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn service(cache: &ReferenceCache, remote: impl RemoteStore + 'static, online: bool) -> SyncService {
        SyncService::new(
            cache.clone(),
            Arc::new(remote),
            Arc::new(Probe(AtomicBool::new(online))),
            CancellationToken::new(),
        )
    }

    fn cached_ids(cache: &ReferenceCache) -> Vec<String> {
        cache.routes().all().unwrap().into_iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_sync_replaces_not_merges() {
        let cache = ReferenceCache::open_in_memory().unwrap();
        cache.routes().replace(&[route("a"), route("b")]).unwrap();

        let remote = FixedRemote {
            routes: vec![json!(route("b")), json!(route("c"))],
            users: vec![],
        };
        let summary = service(&cache, remote, true)
            .sync_collection(CollectionKind::Routes)
            .await
            .unwrap();

        assert_eq!(summary.count, 2);
        assert_eq!(cached_ids(&cache), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_empty_route_rejects_whole_sync() {
        let cache = ReferenceCache::open_in_memory().unwrap();
        cache.routes().replace(&[route("a")]).unwrap();

        let mut broken = route("x");
        broken.timetable.clear();
        let remote = FixedRemote {
            routes: vec![json!(route("b")), json!(broken)],
            users: vec![],
        };
        let err = service(&cache, remote, true)
            .sync_collection(CollectionKind::Routes)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::EmptyData);
        assert_eq!(cached_ids(&cache), vec!["a"]);
    }

    #[tokio::test]
    async fn test_missing_or_repeated_route_id_rejects_sync() {
        let cache = ReferenceCache::open_in_memory().unwrap();
        cache.routes().replace(&[route("a")]).unwrap();

        let mut unnamed = json!(route("ignored"));
        unnamed.as_object_mut().unwrap().remove("id");
        for routes in [
            vec![unnamed.clone(), unnamed.clone(), unnamed],
            vec![json!(route("b")), json!(route("c")), json!(route("b"))],
        ] {
            let remote = FixedRemote {
                routes,
                users: vec![],
            };
            let err = service(&cache, remote, true)
                .sync_collection(CollectionKind::Routes)
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::EmptyData);
            assert_eq!(cached_ids(&cache), vec!["a"]);
        }
    }

    #[tokio::test]
    async fn test_repeated_username_rejects_sync() {
        let cache = ReferenceCache::open_in_memory().unwrap();
        let alice = json!({"username": "alice", "password": "$argon2id$x", "name": "Alice"});
        let remote = FixedRemote {
            routes: vec![],
            users: vec![alice.clone(), alice],
        };
        let err = service(&cache, remote, true)
            .sync_collection(CollectionKind::Users)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyData);
        assert!(cache.users().all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_document_rejects_sync() {
        let cache = ReferenceCache::open_in_memory().unwrap();
        let remote = FixedRemote {
            routes: vec![],
            users: vec![json!({"username": "bob"})],
        };
        let err = service(&cache, remote, true)
            .sync_collection(CollectionKind::Users)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyData);
        assert!(cache.users().all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_sync_fails_fast() {
        let cache = ReferenceCache::open_in_memory().unwrap();
        cache.routes().replace(&[route("a")]).unwrap();

        let err = service(&cache, HangingRemote, false)
            .sync_collection(CollectionKind::Routes)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NoConnectivity);
        assert_eq!(cached_ids(&cache), vec!["a"]);
    }

    #[tokio::test]
    async fn test_cancel_aborts_fetch() {
        let cache = ReferenceCache::open_in_memory().unwrap();
        let token = CancellationToken::new();
        let svc = SyncService::new(
            cache.clone(),
            Arc::new(HangingRemote),
            Arc::new(Probe(AtomicBool::new(true))),
            token.clone(),
        );

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            token.cancel();
        });
        let err = svc.sync_collection(CollectionKind::Routes).await.unwrap_err();
        canceller.await.unwrap();
        assert_eq!(err.code, ErrorCode::Cancelled);
    }

    #[tokio::test]
    async fn test_sync_after_shutdown_never_replaces_cache() {
        let cache = ReferenceCache::open_in_memory().unwrap();
        cache.routes().replace(&[route("a")]).unwrap();
        let token = CancellationToken::new();
        let svc = SyncService::new(
            cache.clone(),
            Arc::new(FixedRemote {
                routes: vec![json!(route("b"))],
                users: vec![],
            }),
            Arc::new(Probe(AtomicBool::new(true))),
            token.clone(),
        );
        token.cancel();

        for _ in 0..50 {
            let err = svc.sync_collection(CollectionKind::Routes).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::Cancelled);
        }
        assert_eq!(cached_ids(&cache), vec!["a"]);
    }

    #[tokio::test]
    async fn test_sync_all_loads_users() {
        let cache = ReferenceCache::open_in_memory().unwrap();
        let remote = FixedRemote {
            routes: vec![json!(route("a"))],
            users: vec![json!({
                "username": "alice",
                "password": "$argon2id$hash",
                "name": "Alice",
                "role": "admin"
            })],
        };
        let summaries = service(&cache, remote, true).sync_all().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].collection, CollectionKind::Users);
        assert_eq!(cache.users().find("alice").unwrap().unwrap().name, "Alice");
    }
}
