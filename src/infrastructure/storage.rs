use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::errors::StoreError;
use crate::repositories::blob::BlobStore;
use crate::settings::AppConfig;

/// Blob store client: `PUT {base}/{key}` with the raw bytes, response
/// body `{"url": "..."}` holding the fetchable address.
#[derive(Clone)]
pub struct HttpBlobStore {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

impl HttpBlobStore {
    pub fn new(config: &AppConfig) -> Result<Self, StoreError> {
        Ok(HttpBlobStore {
            client: Client::new(),
            base_url: Url::parse(&config.storage_url)?,
            api_key: config.api_key.clone(),
        })
    }

    fn blob_url(&self, key: &str) -> Result<Url, StoreError> {
        let mut path = self.base_url.as_str().trim_end_matches('/').to_string();
        for segment in key.split('/') {
            path.push('/');
            path.push_str(&urlencoding::encode(segment));
        }
        Ok(Url::parse(&path)?)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        let url = self.blob_url(key)?;
        let mut request = self
            .client
            .put(url)
            .header("content-type", content_type)
            .body(bytes);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await?.error_for_status()?;
        let body: UploadResponse = response.json().await?;
        Ok(body.url)
    }
}

/// In-process blob store for tests. Addresses are stable per key, so
/// re-uploads overwrite in place like the real store.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.get(key).map(|b| b.value().clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StoreError> {
        self.blobs.insert(key.to_string(), bytes);
        Ok(format!("memory://{key}"))
    }
}
