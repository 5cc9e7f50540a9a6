//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Each port exposes a strongly typed error enum so adapters map their
//! failures into predictable variants. Services translate those into the
//! transport-agnostic [`crate::domain::Error`].

mod macros;
pub(crate) use macros::define_port_error;

mod blob_store;
mod content_repository;
mod identity_provider;
mod member_sequence;
mod payment_verifier;
mod profile_repository;
mod purchase_repository;

#[cfg(test)]
pub use blob_store::MockBlobStore;
pub use blob_store::{
    BLOB_CHUNK_SIZE, BlobChunks, BlobStore, BlobStoreError, OpenedBlob, chunked,
};
#[cfg(test)]
pub use content_repository::MockContentRepository;
pub use content_repository::{ContentRepository, ContentRepositoryError};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{FixtureIdentityProvider, IdentityProvider, IdentityProviderError};
#[cfg(test)]
pub use member_sequence::MockMemberSequence;
pub use member_sequence::{MemberSequence, MemberSequenceError};
#[cfg(test)]
pub use payment_verifier::MockPaymentVerifier;
pub use payment_verifier::{FixturePaymentVerifier, PaymentVerifier, PaymentVerifierError};
#[cfg(test)]
pub use profile_repository::{MockAdminProfileRepository, MockUserProfileRepository};
pub use profile_repository::{
    AdminProfileRepository, PlaceholderFill, ProfileCompletionRecord, ProfileRepositoryError,
    UserProfileRepository,
};
#[cfg(test)]
pub use purchase_repository::MockPurchaseRepository;
pub use purchase_repository::{PurchaseRepository, PurchaseRepositoryError};
