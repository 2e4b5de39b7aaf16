/// Object-store client for listing images.
///
/// The store is external: uploads that survive a rolled-back database
/// transaction are an accepted leak, cleaned up out of band.
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client as HttpClient;
use std::time::Duration;

use crate::config::StorageConfig;
use crate::error::{AppError, Result};

/// Minimal blob-store capability consumed by the listing pipeline.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store an object under `key` and return its public URL.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String>;

    /// Remove an object. Missing objects are not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// HTTP-backed blob store speaking the storage gateway's object API.
pub struct HttpBlobStore {
    http_client: HttpClient,
    base_url: String,
    bucket: String,
    api_key: String,
}

impl HttpBlobStore {
    pub fn from_config(cfg: &StorageConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| AppError::Storage(format!("Failed to create HTTP client: {e}")))?;

        tracing::info!(bucket = %cfg.bucket, "Blob storage client initialized");

        Ok(Self {
            http_client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            bucket: cfg.bucket.clone(),
            api_key: cfg.api_key.clone(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/object/{}/{}", self.base_url, self.bucket, key)
    }

    /// Public URL for an object key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, self.bucket, key)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        let response = self
            .http_client
            .post(self.object_url(key))
            .bearer_auth(&self.api_key)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Upload failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "Upload failed with status {}: {}",
                status, body
            )));
        }

        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self
            .http_client
            .delete(self.object_url(key))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Delete failed: {e}")))?;

        if !response.status().is_success() && response.status().as_u16() != 404 {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "Delete failed with status {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HttpBlobStore {
        HttpBlobStore::from_config(&StorageConfig {
            base_url: "http://localhost:54321/storage/v1/".to_string(),
            bucket: "listing-images".to_string(),
            api_key: "test-key".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn public_url_includes_bucket_and_key() {
        let url = store().public_url("listings/abc/img.jpg");
        assert_eq!(
            url,
            "http://localhost:54321/storage/v1/object/public/listing-images/listings/abc/img.jpg"
        );
    }

    #[test]
    fn trailing_slash_in_base_url_is_normalized() {
        let url = store().object_url("k");
        assert_eq!(
            url,
            "http://localhost:54321/storage/v1/object/listing-images/k"
        );
    }
}
