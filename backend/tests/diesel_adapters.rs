//! Diesel adapters against embedded PostgreSQL.
//!
//! Covers behaviour that only the database can show: blob name conflicts
//! resolved by `ON CONFLICT DO NOTHING`, the department counter upsert, the
//! purchase primary key, and narrow profile updates leaving other columns
//! alone.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::TryStreamExt;
use futures::future::join_all;
use library_backend::domain::ports::{
    BlobStore, ContentRepository, MemberSequence, PurchaseRepository, PurchaseRepositoryError,
    UserProfileRepository,
};
use library_backend::domain::{
    BLOB_NAME_MAX, BlobName, ContentItem, ContentItemId, Department, ItemFilter, MediaLocator,
    Price, ProofStatus, Purchase, SubjectId, UserProfile,
};
use library_backend::outbound::persistence::{
    DbPool, DieselBlobStore, DieselContentRepository, DieselMemberSequence,
    DieselProfileRepository, DieselPurchaseRepository, PoolConfig,
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

#[path = "support/pg_embed.rs"]
mod pg_embed;

use pg_embed::{handle_cluster_setup_failure, migrated_database};

/// Fields drop in order: the pool closes before the database goes away.
struct TestContext {
    pool: DbPool,
    runtime: Runtime,
    _database: TemporaryDatabase,
}

fn setup_test_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let database = migrated_database(&runtime)?;
    let config = PoolConfig::new(database.url())
        .with_max_size(4)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;
    Ok(TestContext {
        pool,
        runtime,
        _database: database,
    })
}

#[fixture]
fn postgres() -> Option<TestContext> {
    match setup_test_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn blob_store(ctx: &TestContext) -> DieselBlobStore {
    DieselBlobStore::new(
        ctx.pool.clone(),
        MediaLocator::default(),
        Arc::new(DefaultClock),
    )
}

fn subject(raw: &str) -> SubjectId {
    SubjectId::new(raw).expect("subject")
}

fn item(title: &str, uploaded_minutes_ago: i64) -> ContentItem {
    ContentItem {
        id: ContentItemId::random(),
        title: title.to_owned(),
        author: "R. Feynman".to_owned(),
        description: None,
        department: Some("PHY".to_owned()),
        semester: None,
        premium: true,
        price: Price::from_minor_units(4_900),
        featured: false,
        cover: None,
        document: None,
        uploaded_by: None,
        uploaded_at: Utc::now() - Duration::minutes(uploaded_minutes_ago),
    }
}

fn purchase(raw: &str, item: ContentItemId) -> Purchase {
    Purchase {
        subject: subject(raw),
        item,
        amount: Price::from_minor_units(4_900),
        purchased_at: Utc::now(),
        transaction_ref: Some(format!("txn-{raw}")),
    }
}

async fn read_all(store: &DieselBlobStore, name: &BlobName) -> Vec<u8> {
    let opened = store.open(name).await.expect("open").expect("stored blob");
    let chunks: Vec<Vec<u8>> = opened.content.try_collect().await.expect("content");
    chunks.concat()
}

#[rstest]
fn colliding_blob_names_land_on_a_fresh_variant(postgres: Option<TestContext>) {
    let Some(ctx) = postgres else { return };
    let store = blob_store(&ctx);
    let requested = BlobName::new("covers/atlas.png").expect("name");

    ctx.runtime.block_on(async {
        let first = store
            .save(&requested, b"first".to_vec(), Some("image/png".to_owned()))
            .await
            .expect("first save");
        let second = store
            .save(&requested, b"second".to_vec(), Some("image/png".to_owned()))
            .await
            .expect("second save");

        assert_eq!(first, requested);
        assert_ne!(second, requested);
        assert!(second.as_ref().starts_with("covers/atlas_"), "{second}");
        assert_eq!(second.extension(), Some("png"));
        assert_eq!(read_all(&store, &first).await, b"first");
        assert_eq!(read_all(&store, &second).await, b"second");
    });
}

#[rstest]
fn names_at_the_column_limit_still_disambiguate(postgres: Option<TestContext>) {
    let Some(ctx) = postgres else { return };
    let store = blob_store(&ctx);
    let stem = "y".repeat(BLOB_NAME_MAX - "books/pdfs/.pdf".len());
    let requested = BlobName::new(format!("books/pdfs/{stem}.pdf")).expect("name");

    ctx.runtime.block_on(async {
        store
            .save(&requested, b"%PDF-1".to_vec(), None)
            .await
            .expect("first save");
        let second = store
            .save(&requested, b"%PDF-2".to_vec(), None)
            .await
            .expect("second save");

        assert_ne!(second, requested);
        assert!(second.as_ref().len() <= BLOB_NAME_MAX);
        assert!(store.exists(&second).await.expect("exists"));
    });
}

#[rstest]
fn deleted_blobs_are_gone(postgres: Option<TestContext>) {
    let Some(ctx) = postgres else { return };
    let store = blob_store(&ctx);
    let name = BlobName::new("id-proofs/uid-1_card.pdf").expect("name");

    ctx.runtime.block_on(async {
        store.save(&name, b"%PDF".to_vec(), None).await.expect("save");
        store.delete(&name).await.expect("delete");
        store.delete(&name).await.expect("deleting twice is harmless");

        assert!(!store.exists(&name).await.expect("exists"));
        assert!(store.open(&name).await.expect("open").is_none());
    });
}

#[rstest]
fn member_numbers_count_per_department(postgres: Option<TestContext>) {
    let Some(ctx) = postgres else { return };
    let sequence = DieselMemberSequence::new(ctx.pool.clone());
    let cse = Department::new("CSE").expect("department");
    let ece = Department::new("ECE").expect("department");

    ctx.runtime.block_on(async {
        let mut cse_values = Vec::new();
        for _ in 0..3 {
            cse_values.push(sequence.next(&cse).await.expect("next"));
        }
        assert_eq!(cse_values, vec![1, 2, 3]);
        assert_eq!(sequence.next(&ece).await.expect("next"), 1);
        assert_eq!(sequence.next(&cse).await.expect("next"), 4);
    });
}

#[rstest]
fn concurrent_member_numbers_never_repeat(postgres: Option<TestContext>) {
    let Some(ctx) = postgres else { return };
    let sequence = DieselMemberSequence::new(ctx.pool.clone());
    let department = Department::new("ME").expect("department");

    let values: BTreeSet<u32> = ctx.runtime.block_on(async {
        join_all((0..12).map(|_| sequence.next(&department)))
            .await
            .into_iter()
            .map(|value| value.expect("next"))
            .collect()
    });

    assert_eq!(values, (1..=12).collect());
}

#[rstest]
fn a_second_purchase_of_the_same_item_is_a_duplicate(postgres: Option<TestContext>) {
    let Some(ctx) = postgres else { return };
    let items = DieselContentRepository::new(ctx.pool.clone());
    let purchases = DieselPurchaseRepository::new(ctx.pool.clone());
    let book = item("Lectures on Physics", 0);

    ctx.runtime.block_on(async {
        items.insert(&book).await.expect("insert item");
        purchases
            .record(&purchase("uid-1", book.id))
            .await
            .expect("first purchase");

        let err = purchases
            .record(&purchase("uid-1", book.id))
            .await
            .expect_err("duplicate");
        assert_eq!(
            err,
            PurchaseRepositoryError::duplicate("uid-1", book.id.to_string())
        );

        purchases
            .record(&purchase("uid-2", book.id))
            .await
            .expect("another member may buy it");
        assert!(
            purchases
                .exists(&subject("uid-1"), book.id)
                .await
                .expect("exists")
        );
        assert_eq!(
            purchases
                .list_for(&subject("uid-1"))
                .await
                .expect("history")
                .len(),
            1
        );
    });
}

#[rstest]
fn purchase_history_outlives_removed_items(postgres: Option<TestContext>) {
    let Some(ctx) = postgres else { return };
    let items = DieselContentRepository::new(ctx.pool.clone());
    let purchases = DieselPurchaseRepository::new(ctx.pool.clone());
    let book = item("QED", 0);

    ctx.runtime.block_on(async {
        items.insert(&book).await.expect("insert item");
        purchases
            .record(&purchase("uid-1", book.id))
            .await
            .expect("purchase");
        assert!(items.delete(book.id).await.expect("delete"));

        let history = purchases.list_for(&subject("uid-1")).await.expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history.first().map(|p| p.item), Some(book.id));
    });
}

#[rstest]
fn catalogue_search_treats_wildcards_literally(postgres: Option<TestContext>) {
    let Some(ctx) = postgres else { return };
    let items = DieselContentRepository::new(ctx.pool.clone());
    let discounted = item("50% Off Thermodynamics", 10);
    let long = item("500 Problems in Optics", 5);
    let featured = ContentItem {
        featured: true,
        ..item("Six Easy Pieces", 1)
    };

    ctx.runtime.block_on(async {
        for book in [&discounted, &long, &featured] {
            items.insert(book).await.expect("insert item");
        }

        let search = |needle: &str| ItemFilter {
            search: Some(needle.to_owned()),
            ..ItemFilter::default()
        };
        let titles = |found: Vec<ContentItem>| {
            found.into_iter().map(|i| i.title).collect::<Vec<_>>()
        };

        assert_eq!(
            titles(items.list(&search("50%")).await.expect("list")),
            vec!["50% Off Thermodynamics"]
        );
        assert_eq!(
            titles(items.list(&search("feynman")).await.expect("list")),
            vec!["Six Easy Pieces", "500 Problems in Optics", "50% Off Thermodynamics"]
        );
        let only_featured = ItemFilter {
            featured: Some(true),
            ..ItemFilter::default()
        };
        assert_eq!(
            titles(items.list(&only_featured).await.expect("list")),
            vec!["Six Easy Pieces"]
        );
    });
}

#[rstest]
fn proof_uploads_keep_suspension_and_reset_review(postgres: Option<TestContext>) {
    let Some(ctx) = postgres else { return };
    let profiles = DieselProfileRepository::new(ctx.pool.clone());
    let member = subject("uid-7");
    let proof = BlobName::new("id-proofs/uid-7_card.pdf").expect("name");

    ctx.runtime.block_on(async {
        profiles
            .insert(&UserProfile::new(member.clone(), Utc::now()))
            .await
            .expect("insert");
        profiles
            .set_proof_status(
                &member,
                &ProofStatus::Verified {
                    verified_at: Utc::now(),
                },
            )
            .await
            .expect("review")
            .expect("record");
        profiles
            .set_suspension(&member, Some(Utc::now()))
            .await
            .expect("suspend")
            .expect("record");

        let updated = profiles
            .set_proof_file(&member, &proof, Utc::now())
            .await
            .expect("proof")
            .expect("record");

        assert!(updated.suspended_at.is_some());
        assert_eq!(updated.proof.file.as_ref(), Some(&proof));
        assert_eq!(updated.proof.status, ProofStatus::Unverified);
        assert!(
            profiles
                .set_proof_file(&subject("nobody"), &proof, Utc::now())
                .await
                .expect("write")
                .is_none()
        );
    });
}
