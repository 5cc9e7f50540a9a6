//! Blob store and member sequence kept in PostgreSQL.
//!
//! Blob names are the primary key; saves insert with `ON CONFLICT DO NOTHING`
//! and walk the disambiguated candidates until one insert lands. Member
//! numbers come from a single upsert, so concurrent registrations never see
//! the same value.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{
    BlobStore, BlobStoreError, MemberSequence, MemberSequenceError, OpenedBlob, chunked,
};
use crate::domain::{BlobMetadata, BlobName, Department, MediaLocator};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{BlobMetadataRow, NewBlobRow};
use super::pool::{DbPool, PoolError};
use super::schema::{blobs, department_counters};

/// Diesel-backed implementation of the `BlobStore` port.
#[derive(Clone)]
pub struct DieselBlobStore {
    pool: DbPool,
    locator: MediaLocator,
    clock: Arc<dyn Clock>,
}

impl DieselBlobStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool, locator: MediaLocator, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            locator,
            clock,
        }
    }
}

fn map_pool_error(error: PoolError) -> BlobStoreError {
    map_basic_pool_error(error, BlobStoreError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> BlobStoreError {
    map_basic_diesel_error(error, BlobStoreError::io, BlobStoreError::connection)
}

fn row_to_metadata(row: BlobMetadataRow) -> Result<BlobMetadata, BlobStoreError> {
    let name = BlobName::new(row.name)
        .map_err(|err| BlobStoreError::io(format!("invalid blob name in database: {err}")))?;
    let size = u64::try_from(row.size)
        .map_err(|err| BlobStoreError::io(format!("invalid blob size in database: {err}")))?;
    Ok(BlobMetadata {
        name,
        size,
        content_type: row.content_type,
        created_at: row.created_at,
    })
}

#[async_trait]
impl BlobStore for DieselBlobStore {
    async fn exists(&self, name: &BlobName) -> Result<bool, BlobStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(diesel::dsl::exists(
            blobs::table.filter(blobs::name.eq(name.as_ref())),
        ))
        .get_result::<bool>(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn save(
        &self,
        name: &BlobName,
        content: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<BlobName, BlobStoreError> {
        let size = i64::try_from(content.len())
            .map_err(|_| BlobStoreError::io("blob exceeds storable size"))?;
        let created_at = self.clock.utc();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        for candidate in name.save_candidates() {
            let row = NewBlobRow {
                name: candidate.as_ref(),
                content: &content,
                size,
                content_type: content_type.as_deref(),
                created_at,
            };
            let inserted = diesel::insert_into(blobs::table)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            if inserted > 0 {
                return Ok(candidate);
            }
            debug!(name = %candidate, "blob name taken; trying another");
        }
        Err(BlobStoreError::names_exhausted(name.as_ref()))
    }

    async fn open(&self, name: &BlobName) -> Result<Option<OpenedBlob>, BlobStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<(BlobMetadataRow, Vec<u8>)> = blobs::table
            .filter(blobs::name.eq(name.as_ref()))
            .select((BlobMetadataRow::as_select(), blobs::content))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|(metadata, content)| {
            Ok(OpenedBlob {
                metadata: row_to_metadata(metadata)?,
                content: chunked(content),
            })
        })
        .transpose()
    }

    async fn delete(&self, name: &BlobName) -> Result<(), BlobStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::delete(blobs::table.filter(blobs::name.eq(name.as_ref())))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    fn url_for(&self, name: &BlobName) -> String {
        self.locator.url_for(name)
    }
}

/// Diesel-backed implementation of the `MemberSequence` port.
#[derive(Clone)]
pub struct DieselMemberSequence {
    pool: DbPool,
}

impl DieselMemberSequence {
    /// Create a new sequence with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberSequence for DieselMemberSequence {
    async fn next(&self, department: &Department) -> Result<u32, MemberSequenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_basic_pool_error(err, MemberSequenceError::connection))?;

        let value: i32 = diesel::insert_into(department_counters::table)
            .values((
                department_counters::department.eq(department.as_ref()),
                department_counters::last_value.eq(1),
            ))
            .on_conflict(department_counters::department)
            .do_update()
            .set(department_counters::last_value.eq(department_counters::last_value + 1))
            .returning(department_counters::last_value)
            .get_result(&mut conn)
            .await
            .map_err(|err| {
                map_basic_diesel_error(
                    err,
                    MemberSequenceError::query,
                    MemberSequenceError::connection,
                )
            })?;

        u32::try_from(value)
            .map_err(|_| MemberSequenceError::query(format!("{department} counter is negative")))
    }
}
