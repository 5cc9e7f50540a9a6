//! PostgreSQL-backed content item and purchase ledger repositories.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    ContentRepository, ContentRepositoryError, PurchaseRepository, PurchaseRepositoryError,
};
use crate::domain::{
    BlobName, ContentItem, ContentItemId, ItemFile, ItemFilter, Price, Purchase, SubjectId,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, map_unique_diesel_error,
};
use super::models::{ContentItemRow, ContentItemValues, NewPurchaseRow, PurchaseRow};
use super::pool::{DbPool, PoolError};
use super::schema::{content_items, purchases};
use super::search_pattern::contains_pattern;

/// Diesel-backed implementation of the `ContentRepository` port.
#[derive(Clone)]
pub struct DieselContentRepository {
    pool: DbPool,
}

impl DieselContentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ContentRepositoryError {
    map_basic_pool_error(error, ContentRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ContentRepositoryError {
    map_basic_diesel_error(
        error,
        ContentRepositoryError::query,
        ContentRepositoryError::connection,
    )
}

fn price_for_db(price: Price) -> Result<i64, ContentRepositoryError> {
    i64::try_from(price.minor_units())
        .map_err(|_| ContentRepositoryError::query("price exceeds storable range"))
}

fn row_to_item(row: ContentItemRow) -> Result<ContentItem, ContentRepositoryError> {
    let corrupt = |field: &str, err: &dyn std::fmt::Display| {
        ContentRepositoryError::query(format!("invalid {field} in database: {err}"))
    };
    let price = u64::try_from(row.price_minor).map_err(|err| corrupt("price", &err))?;
    let cover = row
        .cover_blob
        .map(BlobName::new)
        .transpose()
        .map_err(|err| corrupt("cover", &err))?;
    let document = row
        .document_blob
        .map(BlobName::new)
        .transpose()
        .map_err(|err| corrupt("document", &err))?;
    let uploaded_by = row
        .uploaded_by
        .map(SubjectId::new)
        .transpose()
        .map_err(|err| corrupt("uploader", &err))?;

    Ok(ContentItem {
        id: ContentItemId::from_uuid(row.id),
        title: row.title,
        author: row.author,
        description: row.description,
        department: row.department,
        semester: row.semester,
        premium: row.premium,
        price: Price::from_minor_units(price),
        featured: row.featured,
        cover,
        document,
        uploaded_by,
        uploaded_at: row.uploaded_at,
    })
}

fn item_values(item: &ContentItem) -> Result<ContentItemValues<'_>, ContentRepositoryError> {
    Ok(ContentItemValues {
        id: *item.id.as_uuid(),
        title: &item.title,
        author: &item.author,
        description: item.description.as_deref(),
        department: item.department.as_deref(),
        semester: item.semester.as_deref(),
        premium: item.premium,
        price_minor: price_for_db(item.price)?,
        featured: item.featured,
        cover_blob: item.cover.as_ref().map(AsRef::as_ref),
        document_blob: item.document.as_ref().map(AsRef::as_ref),
        uploaded_by: item.uploaded_by.as_ref().map(AsRef::as_ref),
        uploaded_at: item.uploaded_at,
    })
}

#[async_trait]
impl ContentRepository for DieselContentRepository {
    async fn find(&self, id: ContentItemId) -> Result<Option<ContentItem>, ContentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ContentItemRow> = content_items::table
            .filter(content_items::id.eq(id.as_uuid()))
            .select(ContentItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_item).transpose()
    }

    async fn insert(&self, item: &ContentItem) -> Result<(), ContentRepositoryError> {
        let values = item_values(item)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(content_items::table)
            .values(&values)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list(&self, filter: &ItemFilter) -> Result<Vec<ContentItem>, ContentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = content_items::table.into_boxed();
        if let Some(department) = filter.department.as_deref() {
            query = query.filter(content_items::department.eq(department));
        }
        if let Some(semester) = filter.semester.as_deref() {
            query = query.filter(content_items::semester.eq(semester));
        }
        if let Some(premium) = filter.premium {
            query = query.filter(content_items::premium.eq(premium));
        }
        if let Some(featured) = filter.featured {
            query = query.filter(content_items::featured.eq(featured));
        }
        if let Some(search) = filter.search.as_deref() {
            let pattern = contains_pattern(search);
            query = query.filter(
                content_items::title
                    .ilike(pattern.clone())
                    .or(content_items::author.ilike(pattern)),
            );
        }

        let rows: Vec<ContentItemRow> = query
            .order((content_items::uploaded_at.desc(), content_items::id.asc()))
            .select(ContentItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_item).collect()
    }

    async fn set_file(
        &self,
        id: ContentItemId,
        file: ItemFile,
        name: &BlobName,
    ) -> Result<Option<ContentItem>, ContentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let target = content_items::table.filter(content_items::id.eq(id.as_uuid()));
        let name = name.as_ref();

        let row: Option<ContentItemRow> = match file {
            ItemFile::Cover => {
                diesel::update(target)
                    .set(content_items::cover_blob.eq(name))
                    .returning(ContentItemRow::as_returning())
                    .get_result(&mut conn)
                    .await
            }
            ItemFile::Document => {
                diesel::update(target)
                    .set(content_items::document_blob.eq(name))
                    .returning(ContentItemRow::as_returning())
                    .get_result(&mut conn)
                    .await
            }
        }
        .optional()
        .map_err(map_diesel_error)?;

        row.map(row_to_item).transpose()
    }

    async fn delete(&self, id: ContentItemId) -> Result<bool, ContentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted_rows = diesel::delete(content_items::table.filter(content_items::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted_rows > 0)
    }
}

/// Diesel-backed implementation of the `PurchaseRepository` port.
#[derive(Clone)]
pub struct DieselPurchaseRepository {
    pool: DbPool,
}

impl DieselPurchaseRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_purchase_pool_error(error: PoolError) -> PurchaseRepositoryError {
    map_basic_pool_error(error, PurchaseRepositoryError::connection)
}

fn map_purchase_diesel_error(
    error: diesel::result::Error,
    purchase: Option<&Purchase>,
) -> PurchaseRepositoryError {
    map_unique_diesel_error(
        error,
        |_| match purchase {
            Some(purchase) => PurchaseRepositoryError::duplicate(
                purchase.subject.as_ref(),
                purchase.item.to_string(),
            ),
            None => PurchaseRepositoryError::query("unexpected unique violation"),
        },
        PurchaseRepositoryError::query,
        PurchaseRepositoryError::connection,
    )
}

fn row_to_purchase(row: PurchaseRow) -> Result<Purchase, PurchaseRepositoryError> {
    let subject = SubjectId::new(row.subject)
        .map_err(|err| PurchaseRepositoryError::query(format!("invalid subject in database: {err}")))?;
    let amount = u64::try_from(row.amount_minor).map_err(|err| {
        PurchaseRepositoryError::query(format!("invalid amount in database: {err}"))
    })?;
    Ok(Purchase {
        subject,
        item: ContentItemId::from_uuid(row.item_id),
        amount: Price::from_minor_units(amount),
        purchased_at: row.purchased_at,
        transaction_ref: row.transaction_ref,
    })
}

#[async_trait]
impl PurchaseRepository for DieselPurchaseRepository {
    async fn exists(
        &self,
        subject: &SubjectId,
        item: ContentItemId,
    ) -> Result<bool, PurchaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_purchase_pool_error)?;

        diesel::select(diesel::dsl::exists(
            purchases::table
                .filter(purchases::subject.eq(subject.as_ref()))
                .filter(purchases::item_id.eq(item.as_uuid())),
        ))
        .get_result::<bool>(&mut conn)
        .await
        .map_err(|err| map_purchase_diesel_error(err, None))
    }

    async fn list_for(&self, subject: &SubjectId) -> Result<Vec<Purchase>, PurchaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_purchase_pool_error)?;

        let rows: Vec<PurchaseRow> = purchases::table
            .filter(purchases::subject.eq(subject.as_ref()))
            .order((purchases::purchased_at.desc(), purchases::item_id.asc()))
            .select(PurchaseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_purchase_diesel_error(err, None))?;

        rows.into_iter().map(row_to_purchase).collect()
    }

    async fn record(&self, purchase: &Purchase) -> Result<(), PurchaseRepositoryError> {
        let amount_minor = i64::try_from(purchase.amount.minor_units())
            .map_err(|_| PurchaseRepositoryError::query("amount exceeds storable range"))?;
        let mut conn = self.pool.get().await.map_err(map_purchase_pool_error)?;

        let new_row = NewPurchaseRow {
            subject: purchase.subject.as_ref(),
            item_id: *purchase.item.as_uuid(),
            amount_minor,
            purchased_at: purchase.purchased_at,
            transaction_ref: purchase.transaction_ref.as_deref(),
        };

        diesel::insert_into(purchases::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_purchase_diesel_error(err, Some(purchase)))
    }
}
