//! In-memory blob store doubles for exercising the listing pipeline
//! without a storage gateway.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use xevip_api::error::{AppError, Result};
use xevip_api::services::BlobStore;

/// Records uploads; optionally starts failing at the nth `put` call.
pub struct MockBlobStore {
    pub uploads: Mutex<Vec<String>>,
    fail_from: Option<usize>,
    calls: AtomicUsize,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_from: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Succeeds for the first `call_index` uploads, then fails.
    pub fn failing_from(call_index: usize) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_from: Some(call_index),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn put(&self, key: &str, _bytes: Bytes, _content_type: &str) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_from.is_some_and(|from| call >= from) {
            return Err(AppError::Storage("simulated upload failure".to_string()));
        }

        self.uploads.lock().unwrap().push(key.to_string());
        Ok(format!("http://blobs.test/{key}"))
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}
