use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};

use super::{ObjectStore, StorageError, StorageErrorCode};

/// S3-compatible bucket reached over plain HTTP, path-style:
/// `{endpoint}/{bucket}/{key}`.
pub struct HttpObjectStore {
    endpoint: String,
    bucket: String,
    bearer_token: Option<String>,
    client: Client,
}

impl HttpObjectStore {
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            bearer_token: None,
            client: Client::new(),
        }
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key.trim_start_matches('/'))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

fn network_error(key: &str, e: reqwest::Error) -> StorageError {
    StorageError::new(StorageErrorCode::Network, format!("{key}: {e}"))
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let resp = self
            .authorize(self.client.get(self.object_url(key)))
            .send()
            .await
            .map_err(|e| network_error(key, e))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let bytes = resp.bytes().await.map_err(|e| network_error(key, e))?;
                Ok(Some(bytes.to_vec()))
            }
            status => Err(StorageError::new(
                StorageErrorCode::Backend,
                format!("GET {key} returned {status}"),
            )),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        let resp = self
            .authorize(self.client.put(self.object_url(key)))
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| network_error(key, e))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(StorageError::new(
                StorageErrorCode::Backend,
                format!("PUT {key} returned {}", resp.status()),
            ))
        }
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
