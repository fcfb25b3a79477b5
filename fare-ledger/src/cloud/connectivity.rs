//! Internet reachability probe

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Best-effort network reachability check
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Sends `HEAD` to each endpoint in turn; any answer at all means online
pub struct HttpConnectivityProbe {
    client: Client,
    endpoints: Vec<String>,
}

impl HttpConnectivityProbe {
    pub fn new(endpoints: Vec<String>, timeout: Duration) -> Self {
        // Fall back to a default client if the builder rejects the options
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client, endpoints }
    }
}

#[async_trait]
impl ConnectivityProbe for HttpConnectivityProbe {
    async fn is_reachable(&self) -> bool {
        for endpoint in &self.endpoints {
            match self.client.head(endpoint).send().await {
                Ok(_) => return true,
                Err(e) => tracing::debug!(endpoint = %endpoint, error = %e, "Connectivity probe failed"),
            }
        }
        false
    }
}
