//! Port for name-addressed binary storage.
//!
//! Every implementation shares the same contract:
//!
//! - `save` never overwrites. When the requested name is taken the blob is
//!   stored under a disambiguated variant and that name is returned.
//! - the recorded size always equals the stored byte length.
//! - `delete` is idempotent.
//! - `open` streams content in chunks so large documents are never buffered
//!   whole by the serving path.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::{BlobMetadata, BlobName};

use super::define_port_error;

/// Chunk size used by adapters when streaming blob content.
pub const BLOB_CHUNK_SIZE: usize = 64 * 1024;

define_port_error! {
    /// Errors raised by blob store adapters.
    pub enum BlobStoreError {
        /// Backing store could not be reached.
        Connection { message: String } => "blob store connection failed: {message}",
        /// Read, write or delete failed.
        Io { message: String } => "blob store operation failed: {message}",
        /// Every candidate name for a save was already taken.
        NamesExhausted { name: String } => "no free name found for blob {name}",
    }
}

/// Stream of content chunks.
pub type BlobChunks = BoxStream<'static, Result<Vec<u8>, BlobStoreError>>;

/// An opened blob: its metadata and a content stream.
pub struct OpenedBlob {
    pub metadata: BlobMetadata,
    pub content: BlobChunks,
}

impl std::fmt::Debug for OpenedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedBlob")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Whether a blob is stored under `name`.
    async fn exists(&self, name: &BlobName) -> Result<bool, BlobStoreError>;

    /// Store `content` under `name` or a disambiguated variant of it.
    ///
    /// Returns the name the content was actually stored under.
    async fn save(
        &self,
        name: &BlobName,
        content: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<BlobName, BlobStoreError>;

    /// Open a blob for streaming. Returns `None` when nothing is stored.
    async fn open(&self, name: &BlobName) -> Result<Option<OpenedBlob>, BlobStoreError>;

    /// Remove a blob. Removing a missing blob succeeds.
    async fn delete(&self, name: &BlobName) -> Result<(), BlobStoreError>;

    /// Public locator for `name`.
    fn url_for(&self, name: &BlobName) -> String;
}

/// Split owned content into stream chunks of at most [`BLOB_CHUNK_SIZE`].
#[must_use]
pub fn chunked(content: Vec<u8>) -> BlobChunks {
    let chunks: Vec<Result<Vec<u8>, BlobStoreError>> = content
        .chunks(BLOB_CHUNK_SIZE)
        .map(|chunk| Ok(chunk.to_vec()))
        .collect();
    Box::pin(futures_util::stream::iter(chunks))
}
