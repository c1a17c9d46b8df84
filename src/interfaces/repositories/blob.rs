use async_trait::async_trait;

use crate::errors::StoreError;

/// Contract of the remote blob store holding profile images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads `bytes` under `key`, overwriting any previous blob, and
    /// returns the fetchable address.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, StoreError>;
}
