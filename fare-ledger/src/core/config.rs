use shared::error::{AppError, AppResult};
use std::str::FromStr;
use std::time::Duration;

/// Ledger configuration
///
/// # Environment variables
///
/// Every field can be overridden from the environment (or a `.env` file):
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | Working directory |
/// | LEDGER_DB_PATH | {WORK_DIR}/ledger.db | SQLite ledger file |
/// | CACHE_DB_PATH | {WORK_DIR}/reference.redb | Reference cache file |
/// | DB_MAX_CONNECTIONS | 5 | Ledger pool size |
/// | DB_BUSY_TIMEOUT_MS | 5000 | SQLite busy timeout |
/// | REMOTE_URL | http://localhost:8080 | Remote store base URL |
/// | REMOTE_API_KEY | (none) | Bearer key for the remote store |
/// | REMOTE_TIMEOUT_MS | 30000 | Remote request timeout |
/// | CONNECTIVITY_ENDPOINTS | https://www.google.com,https://www.cloudflare.com | Probe targets |
/// | CONNECTIVITY_TIMEOUT_MS | 10000 | Probe timeout |
/// | LOG_LEVEL | info | Log level |
/// | LOG_DIR | {WORK_DIR}/logs | Rolling log directory |
/// | ENVIRONMENT | development | development / production |
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the databases and logs
    pub work_dir: String,
    pub ledger_db_path: String,
    pub cache_db_path: String,
    pub db_max_connections: u32,
    pub db_busy_timeout_ms: u64,
    pub remote_url: String,
    pub remote_api_key: Option<String>,
    pub remote_timeout_ms: u64,
    /// Two independent well-known endpoints
    pub connectivity_endpoints: Vec<String>,
    pub connectivity_timeout_ms: u64,
    pub log_level: String,
    pub log_dir: String,
    /// development | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let work_dir = get("WORK_DIR").unwrap_or_else(|| "./data".into());
        Self {
            ledger_db_path: get("LEDGER_DB_PATH").unwrap_or_else(|| format!("{work_dir}/ledger.db")),
            cache_db_path: get("CACHE_DB_PATH")
                .unwrap_or_else(|| format!("{work_dir}/reference.redb")),
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 5),
            db_busy_timeout_ms: parse_or(&get, "DB_BUSY_TIMEOUT_MS", 5000),
            remote_url: get("REMOTE_URL").unwrap_or_else(|| "http://localhost:8080".into()),
            remote_api_key: get("REMOTE_API_KEY").filter(|k| !k.is_empty()),
            remote_timeout_ms: parse_or(&get, "REMOTE_TIMEOUT_MS", 30000),
            connectivity_endpoints: get("CONNECTIVITY_ENDPOINTS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_else(|| {
                    vec![
                        "https://www.google.com".into(),
                        "https://www.cloudflare.com".into(),
                    ]
                }),
            connectivity_timeout_ms: parse_or(&get, "CONNECTIVITY_TIMEOUT_MS", 10000),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: get("LOG_DIR").unwrap_or_else(|| format!("{work_dir}/logs")),
            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".into()),
            work_dir,
        }
    }

    /// Reject settings the services cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if !(self.remote_url.starts_with("http://") || self.remote_url.starts_with("https://")) {
            return Err(AppError::config(format!(
                "REMOTE_URL must be an http(s) URL: {}",
                self.remote_url
            )));
        }
        if self.connectivity_endpoints.is_empty() {
            return Err(AppError::config("CONNECTIVITY_ENDPOINTS is empty"));
        }
        if self.db_max_connections == 0 {
            return Err(AppError::config("DB_MAX_CONNECTIONS must be at least 1"));
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.db_busy_timeout_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn connectivity_timeout(&self) -> Duration {
        Duration::from_millis(self.connectivity_timeout_ms)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// Parse `key` into the field's own type; missing or out-of-range values fall back
fn parse_or<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    get(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
