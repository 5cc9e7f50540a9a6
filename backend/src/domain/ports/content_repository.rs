//! Port for content item persistence.

use async_trait::async_trait;

use crate::domain::{BlobName, ContentItem, ContentItemId, ItemFilter, ItemFile};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by content repository adapters.
    pub enum ContentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "content repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "content repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn find(&self, id: ContentItemId) -> Result<Option<ContentItem>, ContentRepositoryError>;

    async fn insert(&self, item: &ContentItem) -> Result<(), ContentRepositoryError>;

    /// Items matching `filter`, newest upload first.
    async fn list(&self, filter: &ItemFilter) -> Result<Vec<ContentItem>, ContentRepositoryError>;

    /// Point one file reference of an item at `name`, leaving every other
    /// column alone. Returns `None` when the item does not exist.
    async fn set_file(
        &self,
        id: ContentItemId,
        file: ItemFile,
        name: &BlobName,
    ) -> Result<Option<ContentItem>, ContentRepositoryError>;

    /// Remove an item. Returns `false` when none existed.
    async fn delete(&self, id: ContentItemId) -> Result<bool, ContentRepositoryError>;
}
