//! HTTP client for the remote document store

use super::RemoteStore;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::CollectionKind;
use std::time::Duration;

/// REST front of the remote document database
///
/// `GET/POST {base}/collections/{name}`, `PUT/DELETE {base}/collections/{name}/{id}`.
pub struct HttpRemoteStore {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpRemoteStore {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::config(format!("Invalid remote URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::config(format!("Remote URL cannot be a base: {base_url}")));
        }

        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    fn collection_url(&self, kind: CollectionKind) -> AppResult<Url> {
        self.url_with(&["collections", kind.name()])
    }

    /// Document ids are percent-encoded as a single path segment
    fn document_url(&self, kind: CollectionKind, id: &str) -> AppResult<Url> {
        self.url_with(&["collections", kind.name(), id])
    }

    fn url_with(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::config(format!("Remote URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder, what: &str) -> AppResult<Response> {
        let response = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| AppError::remote(format!("Remote {what} request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, what, &body));
        }
        Ok(response)
    }
}

/// Map a non-success status onto the error taxonomy
fn status_error(status: StatusCode, what: &str, body: &str) -> AppError {
    let code = match status {
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::CONFLICT => ErrorCode::AlreadyExists,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorCode::ValidationFailed,
        _ => ErrorCode::RemoteError,
    };
    AppError::with_message(code, format!("Remote {what} failed with status {status}: {body}"))
        .with_detail("status", status.as_u16())
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn find_all(&self, kind: CollectionKind) -> AppResult<Vec<Value>> {
        let response = self
            .send(self.client.get(self.collection_url(kind)?), "fetch")
            .await?;
        let docs: Vec<Value> = response
            .json()
            .await
            .map_err(|e| AppError::remote(format!("Failed to parse {kind} documents: {e}")))?;
        tracing::debug!(collection = %kind, count = docs.len(), "Fetched remote collection");
        Ok(docs)
    }

    async fn insert_one(&self, kind: CollectionKind, doc: Value) -> AppResult<()> {
        self.send(self.client.post(self.collection_url(kind)?).json(&doc), "insert")
            .await?;
        Ok(())
    }

    async fn update_one(&self, kind: CollectionKind, id: &str, doc: Value) -> AppResult<()> {
        self.send(self.client.put(self.document_url(kind, id)?).json(&doc), "update")
            .await?;
        Ok(())
    }

    async fn delete_one(&self, kind: CollectionKind, id: &str) -> AppResult<()> {
        self.send(self.client.delete(self.document_url(kind, id)?), "delete")
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer a single HTTP request with a canned response, returning the
    /// base URL and a handle yielding the raw request head.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut read = 0;
            loop {
                let n = socket.read(&mut buf[read..]).await.unwrap();
                read += n;
                if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..read]).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn test_urls() {
        let store =
            HttpRemoteStore::new("http://remote.local/api/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(
            store.collection_url(CollectionKind::Routes).unwrap().as_str(),
            "http://remote.local/api/collections/routes"
        );
        assert_eq!(
            store.document_url(CollectionKind::Users, "alice").unwrap().as_str(),
            "http://remote.local/api/collections/users/alice"
        );

        let bare = HttpRemoteStore::new("http://remote.local", None, Duration::from_secs(1)).unwrap();
        assert_eq!(
            bare.collection_url(CollectionKind::Users).unwrap().as_str(),
            "http://remote.local/collections/users"
        );
    }

    #[test]
    fn test_document_id_is_one_encoded_segment() {
        let store =
            HttpRemoteStore::new("http://remote.local/api", None, Duration::from_secs(1)).unwrap();
        let url = store.document_url(CollectionKind::Users, "a/b?c#d").unwrap();
        assert_eq!(url.as_str(), "http://remote.local/api/collections/users/a%2Fb%3Fc%23d");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        for base in ["not a url", "mailto:ops@remote.local"] {
            let err = HttpRemoteStore::new(base, None, Duration::from_secs(1))
                .err()
                .unwrap();
            assert_eq!(err.code, ErrorCode::ConfigError);
        }
    }

    #[test]
    fn test_status_error_mapping() {
        let err = status_error(StatusCode::NOT_FOUND, "update", "");
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = status_error(StatusCode::CONFLICT, "insert", "dup");
        assert_eq!(err.code, ErrorCode::AlreadyExists);

        let err = status_error(StatusCode::BAD_GATEWAY, "fetch", "upstream");
        assert_eq!(err.code, ErrorCode::RemoteError);
        assert!(err.is_retryable());
        assert!(err.message.contains("502"));
    }

    #[tokio::test]
    async fn test_find_all_sends_bearer_and_parses() {
        let (url, handle) = serve_once("200 OK", r#"[{"id":"r1"},{"id":"r2"}]"#).await;
        let store =
            HttpRemoteStore::new(&url, Some("secret".into()), Duration::from_secs(5)).unwrap();

        let docs = store.find_all(CollectionKind::Routes).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1]["id"], "r2");

        let request = handle.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /collections/routes "));
        assert!(request.contains("authorization: bearer secret"));
    }

    #[tokio::test]
    async fn test_delete_targets_encoded_document() {
        let (url, handle) = serve_once("200 OK", "{}").await;
        let store = HttpRemoteStore::new(&url, None, Duration::from_secs(5)).unwrap();

        store.delete_one(CollectionKind::Users, "ops/night shift").await.unwrap();

        let request = handle.await.unwrap();
        assert!(request.starts_with("DELETE /collections/users/ops%2Fnight%20shift "));
    }

    #[tokio::test]
    async fn test_server_error_becomes_remote_error() {
        let (url, _handle) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let store = HttpRemoteStore::new(&url, None, Duration::from_secs(5)).unwrap();

        let err = store.delete_one(CollectionKind::Users, "bob").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RemoteError);
        assert!(err.message.contains("boom"));
    }

    #[tokio::test]
    async fn test_unreachable_remote() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store =
            HttpRemoteStore::new(&format!("http://{addr}"), None, Duration::from_secs(2)).unwrap();
        let err = store.find_all(CollectionKind::Routes).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RemoteError);
    }
}
