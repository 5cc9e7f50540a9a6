//! In-process adapters backed by mutex-guarded maps.
//!
//! Used when no database is configured and by integration tests. Each store
//! enforces the same uniqueness rules as the relational schema so behaviour
//! does not change between deployments.

mod blobs;
mod catalogue;
mod profiles;
mod sequence;

pub use blobs::InMemoryBlobStore;
pub use catalogue::{InMemoryContentRepository, InMemoryPurchaseRepository};
pub use profiles::InMemoryProfileStore;
pub use sequence::InMemoryMemberSequence;
