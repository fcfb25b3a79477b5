use std::path::Path;
use std::sync::Arc;

use shared::error::{AppError, AppResult};
use tokio_util::sync::CancellationToken;

use super::Config;
use crate::cache::ReferenceCache;
use crate::cloud::{ConnectivityProbe, HttpConnectivityProbe, HttpRemoteStore, RemoteStore};
use crate::db::DbService;
use crate::services::{CounterService, LedgerService, RouteService, SyncService, UserService};

/// Application state
///
/// Owns the ledger pool, the reference cache and every service built on them.
/// Cloning the services is not needed: callers borrow them from here.
pub struct LedgerApp {
    pub config: Config,
    pub db: DbService,
    pub cache: ReferenceCache,
    pub ledger: LedgerService,
    pub sync: Arc<SyncService>,
    pub routes: RouteService,
    pub users: UserService,
    pub counters: CounterService,
    shutdown: CancellationToken,
}

impl LedgerApp {
    /// Open the databases and wire the HTTP remote store
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        config.validate()?;

        let remote: Arc<dyn RemoteStore> = Arc::new(HttpRemoteStore::new(
            &config.remote_url,
            config.remote_api_key.clone(),
            config.remote_timeout(),
        )?);
        let probe: Arc<dyn ConnectivityProbe> = Arc::new(HttpConnectivityProbe::new(
            config.connectivity_endpoints.clone(),
            config.connectivity_timeout(),
        ));

        Self::with_remote(config, remote, probe).await
    }

    /// Same as [`LedgerApp::initialize`] with caller-supplied remote collaborators
    pub async fn with_remote(
        config: &Config,
        remote: Arc<dyn RemoteStore>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> AppResult<Self> {
        ensure_parent_dir(&config.ledger_db_path)?;
        ensure_parent_dir(&config.cache_db_path)?;

        let db = DbService::new(
            &config.ledger_db_path,
            config.db_max_connections,
            config.busy_timeout(),
        )
        .await?;
        let cache = ReferenceCache::open(&config.cache_db_path)?;
        tracing::info!(path = %config.cache_db_path, "Reference cache opened");

        let shutdown = CancellationToken::new();
        let sync = Arc::new(SyncService::new(
            cache.clone(),
            remote.clone(),
            probe.clone(),
            shutdown.child_token(),
        ));

        Ok(Self {
            config: config.clone(),
            ledger: LedgerService::new(&db),
            routes: RouteService::new(cache.clone(), remote.clone(), probe.clone(), sync.clone()),
            users: UserService::new(cache.clone(), remote, probe, sync.clone()),
            counters: CounterService::new(cache.counts()),
            sync,
            cache,
            db,
            shutdown,
        })
    }

    /// Token cancelled by [`LedgerApp::close`]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancel in-flight syncs and close the ledger pool
    pub async fn close(&self) {
        self.shutdown.cancel();
        self.db.close().await;
        tracing::info!("Ledger shut down");
    }
}

fn ensure_parent_dir(path: &str) -> AppResult<()> {
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::config(format!("Failed to create {}: {e}", parent.display()))
        })?;
    }
    Ok(())
}
