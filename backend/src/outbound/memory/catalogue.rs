//! In-memory content items and purchase ledger.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    ContentRepository, ContentRepositoryError, PurchaseRepository, PurchaseRepositoryError,
};
use crate::domain::{
    BlobName, ContentItem, ContentItemId, ItemFile, ItemFilter, Purchase, SubjectId,
};

/// Content items keyed by identifier.
#[derive(Debug, Default)]
pub struct InMemoryContentRepository {
    items: Mutex<HashMap<ContentItemId, ContentItem>>,
}

impl InMemoryContentRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<ContentItemId, ContentItem>>, ContentRepositoryError> {
        self.items
            .lock()
            .map_err(|_| ContentRepositoryError::query("content store lock poisoned"))
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn find(&self, id: ContentItemId) -> Result<Option<ContentItem>, ContentRepositoryError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    async fn insert(&self, item: &ContentItem) -> Result<(), ContentRepositoryError> {
        self.lock()?.insert(item.id, item.clone());
        Ok(())
    }

    async fn list(&self, filter: &ItemFilter) -> Result<Vec<ContentItem>, ContentRepositoryError> {
        let mut listed: Vec<ContentItem> = self
            .lock()?
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(listed)
    }

    async fn set_file(
        &self,
        id: ContentItemId,
        file: ItemFile,
        name: &BlobName,
    ) -> Result<Option<ContentItem>, ContentRepositoryError> {
        let mut items = self.lock()?;
        let Some(item) = items.get_mut(&id) else {
            return Ok(None);
        };
        let target = match file {
            ItemFile::Cover => &mut item.cover,
            ItemFile::Document => &mut item.document,
        };
        *target = Some(name.clone());
        Ok(Some(item.clone()))
    }

    async fn delete(&self, id: ContentItemId) -> Result<bool, ContentRepositoryError> {
        Ok(self.lock()?.remove(&id).is_some())
    }
}

/// Purchase records, unique per member and item.
#[derive(Debug, Default)]
pub struct InMemoryPurchaseRepository {
    ledger: Mutex<Ledger>,
}

#[derive(Debug, Default)]
struct Ledger {
    keys: HashSet<(SubjectId, ContentItemId)>,
    records: Vec<Purchase>,
}

impl InMemoryPurchaseRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>, PurchaseRepositoryError> {
        self.ledger
            .lock()
            .map_err(|_| PurchaseRepositoryError::query("purchase ledger lock poisoned"))
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryPurchaseRepository {
    async fn exists(
        &self,
        subject: &SubjectId,
        item: ContentItemId,
    ) -> Result<bool, PurchaseRepositoryError> {
        Ok(self.lock()?.keys.contains(&(subject.clone(), item)))
    }

    async fn record(&self, purchase: &Purchase) -> Result<(), PurchaseRepositoryError> {
        let mut ledger = self.lock()?;
        if !ledger.keys.insert((purchase.subject.clone(), purchase.item)) {
            return Err(PurchaseRepositoryError::duplicate(
                purchase.subject.as_ref(),
                purchase.item.to_string(),
            ));
        }
        ledger.records.push(purchase.clone());
        Ok(())
    }

    async fn list_for(&self, subject: &SubjectId) -> Result<Vec<Purchase>, PurchaseRepositoryError> {
        let mut owned: Vec<Purchase> = self
            .lock()?
            .records
            .iter()
            .filter(|purchase| &purchase.subject == subject)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        Ok(owned)
    }
}
