//! In-memory blob store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{BlobStore, BlobStoreError, OpenedBlob, chunked};
use crate::domain::{BlobMetadata, BlobName, MediaLocator};

#[derive(Debug, Clone)]
struct StoredBlob {
    metadata: BlobMetadata,
    content: Vec<u8>,
}

/// Keeps blob content in a process-local map.
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<BlobName, StoredBlob>>,
    locator: MediaLocator,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new(MediaLocator::default(), Arc::new(DefaultClock))
    }
}

impl InMemoryBlobStore {
    pub fn new(locator: MediaLocator, clock: Arc<dyn Clock>) -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            locator,
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<BlobName, StoredBlob>>, BlobStoreError> {
        self.blobs
            .lock()
            .map_err(|_| BlobStoreError::io("blob store lock poisoned"))
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn exists(&self, name: &BlobName) -> Result<bool, BlobStoreError> {
        Ok(self.lock()?.contains_key(name))
    }

    async fn save(
        &self,
        name: &BlobName,
        content: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<BlobName, BlobStoreError> {
        let mut blobs = self.lock()?;
        let Some(chosen) = name
            .save_candidates()
            .into_iter()
            .find(|candidate| !blobs.contains_key(candidate))
        else {
            return Err(BlobStoreError::names_exhausted(name.as_ref()));
        };

        let metadata = BlobMetadata {
            name: chosen.clone(),
            size: content.len() as u64,
            content_type,
            created_at: self.clock.utc(),
        };
        blobs.insert(chosen.clone(), StoredBlob { metadata, content });
        Ok(chosen)
    }

    async fn open(&self, name: &BlobName) -> Result<Option<OpenedBlob>, BlobStoreError> {
        let stored = self.lock()?.get(name).cloned();
        Ok(stored.map(|blob| OpenedBlob {
            metadata: blob.metadata,
            content: chunked(blob.content),
        }))
    }

    async fn delete(&self, name: &BlobName) -> Result<(), BlobStoreError> {
        self.lock()?.remove(name);
        Ok(())
    }

    fn url_for(&self, name: &BlobName) -> String {
        self.locator.url_for(name)
    }
}
