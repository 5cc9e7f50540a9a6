//! Content item lifecycle and per-caller item views.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::account_admin::require_admin;
use super::ports::{BlobStore, ContentRepository};
use super::{
    AccessDecision, BlobName, CheckedUpload, ContentItem, ContentItemId, EntitlementResolver,
    Error, IdentityContext, ItemFile, ItemFilter, Price, check_upload, safe_segment,
    stored_name_for,
};

/// Metadata for a new content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContentItem {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub semester: Option<String>,
    pub premium: bool,
    pub price: Price,
    pub featured: bool,
}

/// A file received for a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpload {
    pub file_name: String,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

/// An item as seen by one caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    pub item: ContentItem,
    pub cover_url: Option<String>,
    pub document_url: Option<String>,
    pub access: AccessDecision,
}

/// Administers the catalogue and answers item queries.
#[derive(Clone)]
pub struct CatalogueService {
    items: Arc<dyn ContentRepository>,
    blobs: Arc<dyn BlobStore>,
    entitlements: EntitlementResolver,
    clock: Arc<dyn Clock>,
}

impl CatalogueService {
    pub fn new(
        items: Arc<dyn ContentRepository>,
        blobs: Arc<dyn BlobStore>,
        entitlements: EntitlementResolver,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            items,
            blobs,
            entitlements,
            clock,
        }
    }

    /// Add an item without files; attach them with
    /// [`replace_cover`](Self::replace_cover) and
    /// [`replace_document`](Self::replace_document).
    ///
    /// A non-premium item is always priced at zero.
    ///
    /// # Errors
    /// `unauthorized`/`forbidden` for non-administrators, `invalid_request`
    /// for a blank title or author.
    pub async fn create_item(
        &self,
        actor: &IdentityContext,
        new_item: NewContentItem,
    ) -> Result<ContentItem, Error> {
        require_admin(actor)?;
        let title = new_item.title.trim();
        let author = new_item.author.trim();
        if title.is_empty() || author.is_empty() {
            return Err(Error::invalid_request("title and author are required"));
        }

        let item = ContentItem {
            id: ContentItemId::random(),
            title: title.to_owned(),
            author: author.to_owned(),
            description: non_blank(new_item.description),
            department: non_blank(new_item.department),
            semester: non_blank(new_item.semester),
            premium: new_item.premium,
            price: if new_item.premium {
                new_item.price
            } else {
                Price::from_minor_units(0)
            },
            featured: new_item.featured,
            cover: None,
            document: None,
            uploaded_by: actor.subject().cloned(),
            uploaded_at: self.clock.utc(),
        };
        self.items.insert(&item).await?;
        info!(item = %item.id, premium = item.premium, "content item created");
        Ok(item)
    }

    /// Replace an item's cover image.
    ///
    /// # Errors
    /// As [`replace_document`](Self::replace_document).
    pub async fn replace_cover(
        &self,
        actor: &IdentityContext,
        id: ContentItemId,
        upload: ItemUpload,
    ) -> Result<ContentItem, Error> {
        self.replace_file(actor, id, upload, ItemFile::Cover).await
    }

    /// Replace an item's primary document.
    ///
    /// The new file is stored and recorded on the item before the previous
    /// one is deleted, so a refused or failed upload leaves the item intact.
    ///
    /// # Errors
    /// `unauthorized`/`forbidden` for non-administrators, `not_found` for
    /// unknown items, `invalid_request` for refused uploads.
    pub async fn replace_document(
        &self,
        actor: &IdentityContext,
        id: ContentItemId,
        upload: ItemUpload,
    ) -> Result<ContentItem, Error> {
        self.replace_file(actor, id, upload, ItemFile::Document).await
    }

    /// Remove an item and both of its stored files.
    ///
    /// # Errors
    /// `unauthorized`/`forbidden` for non-administrators, `not_found` for
    /// unknown items.
    pub async fn delete_item(&self, actor: &IdentityContext, id: ContentItemId) -> Result<(), Error> {
        require_admin(actor)?;
        let item = self.find(id).await?;
        for name in [item.document.as_ref(), item.cover.as_ref()].into_iter().flatten() {
            self.blobs.delete(name).await?;
        }
        if !self.items.delete(id).await? {
            return Err(item_not_found());
        }
        info!(item = %id, "content item deleted");
        Ok(())
    }

    /// Item metadata, file locators and the caller's access decision.
    ///
    /// # Errors
    /// `not_found` for unknown items.
    pub async fn item_details(
        &self,
        ctx: &IdentityContext,
        id: ContentItemId,
    ) -> Result<ItemView, Error> {
        let item = self.find(id).await?;
        let access = self.entitlements.check_access(ctx, &item).await?;
        Ok(ItemView {
            cover_url: item.cover.as_ref().map(|name| self.blobs.url_for(name)),
            document_url: item.document.as_ref().map(|name| self.blobs.url_for(name)),
            item,
            access,
        })
    }

    /// Access decision for the caller on one item.
    ///
    /// # Errors
    /// `not_found` for unknown items.
    pub async fn check_access(
        &self,
        ctx: &IdentityContext,
        id: ContentItemId,
    ) -> Result<AccessDecision, Error> {
        let item = self.find(id).await?;
        self.entitlements.check_access(ctx, &item).await
    }

    /// Catalogue items matching `filter`, newest first.
    ///
    /// # Errors
    /// Store failures.
    pub async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<ContentItem>, Error> {
        Ok(self.items.list(filter).await?)
    }

    /// Fetch an item or fail with `not_found`.
    ///
    /// # Errors
    /// `not_found` for unknown items.
    pub async fn find(&self, id: ContentItemId) -> Result<ContentItem, Error> {
        self.items.find(id).await?.ok_or_else(item_not_found)
    }

    async fn replace_file(
        &self,
        actor: &IdentityContext,
        id: ContentItemId,
        upload: ItemUpload,
        file: ItemFile,
    ) -> Result<ContentItem, Error> {
        require_admin(actor)?;
        let checked = check_upload(
            file.kind(),
            &upload.file_name,
            upload.content,
            upload.content_type.as_deref(),
        )?;
        let current = self.find(id).await?;

        let stored = self.store(&upload.file_name, checked).await?;
        let updated = match self.items.set_file(id, file, &stored).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                warn!(item = %id, "item removed while its file was replaced");
                self.blobs.delete(&stored).await?;
                return Err(item_not_found());
            }
            Err(err) => {
                if let Err(cleanup) = self.blobs.delete(&stored).await {
                    warn!(name = %stored, error = %cleanup, "failed to remove orphaned upload");
                }
                return Err(err.into());
            }
        };

        let previous = match file {
            ItemFile::Cover => current.cover,
            ItemFile::Document => current.document,
        };
        if let Some(old) = previous.filter(|old| old != &stored) {
            if let Err(err) = self.blobs.delete(&old).await {
                warn!(item = %id, name = %old, error = %err, "failed to remove replaced file");
            }
        }
        info!(item = %id, kind = %file.kind(), "content item file replaced");
        Ok(updated)
    }

    async fn store(&self, file_name: &str, checked: CheckedUpload) -> Result<BlobName, Error> {
        let stem = file_name
            .trim()
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();
        let stem = stem.rsplit_once('.').map_or(stem, |(head, _)| head);
        let name = stored_name_for(&checked, &safe_segment(stem))?;
        Ok(self
            .blobs
            .save(&name, checked.content, checked.content_type)
            .await?)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

fn item_not_found() -> Error {
    Error::not_found("book not found").with_reason("not_found")
}
