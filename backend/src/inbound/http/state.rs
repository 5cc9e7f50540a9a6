//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services built over ports and remain testable without I/O.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;

use crate::domain::ports::{
    AdminProfileRepository, BlobStore, ContentRepository, IdentityProvider, MemberSequence,
    PaymentVerifier, PurchaseRepository, UserProfileRepository,
};
use crate::domain::{
    AccountAdministration, BlobName, CatalogueService, CredentialVerifier,
    DEFAULT_VERIFICATION_TIMEOUT, EntitlementResolver, FileServingGateway, ProfileResolver,
    PurchaseService, RegistrationService,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub identity: Arc<dyn IdentityProvider>,
    pub users: Arc<dyn UserProfileRepository>,
    pub admins: Arc<dyn AdminProfileRepository>,
    pub sequence: Arc<dyn MemberSequence>,
    pub blobs: Arc<dyn BlobStore>,
    pub items: Arc<dyn ContentRepository>,
    pub purchases: Arc<dyn PurchaseRepository>,
    pub payments: Arc<dyn PaymentVerifier>,
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub verifier: CredentialVerifier,
    pub resolver: ProfileResolver,
    pub registration: RegistrationService,
    pub accounts: AccountAdministration,
    pub catalogue: CatalogueService,
    pub purchases: PurchaseService,
    pub files: FileServingGateway,
    blobs: Arc<dyn BlobStore>,
}

impl HttpState {
    /// Wire the domain services over `ports`.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use library_backend::domain::ports::{FixtureIdentityProvider, FixturePaymentVerifier};
    /// use library_backend::inbound::http::state::{HttpState, HttpStatePorts};
    /// use library_backend::outbound::memory::{
    ///     InMemoryBlobStore, InMemoryContentRepository, InMemoryMemberSequence,
    ///     InMemoryProfileStore, InMemoryPurchaseRepository,
    /// };
    /// use mockable::DefaultClock;
    ///
    /// let profiles = Arc::new(InMemoryProfileStore::new());
    /// let state = HttpState::new(HttpStatePorts {
    ///     identity: Arc::new(FixtureIdentityProvider::default()),
    ///     users: profiles.clone(),
    ///     admins: profiles,
    ///     sequence: Arc::new(InMemoryMemberSequence::new()),
    ///     blobs: Arc::new(InMemoryBlobStore::default()),
    ///     items: Arc::new(InMemoryContentRepository::new()),
    ///     purchases: Arc::new(InMemoryPurchaseRepository::new()),
    ///     payments: Arc::new(FixturePaymentVerifier),
    ///     clock: Arc::new(DefaultClock),
    /// });
    /// let _files = state.files.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        Self::with_verification_timeout(ports, DEFAULT_VERIFICATION_TIMEOUT)
    }

    /// Same as [`HttpState::new`] with an explicit identity-service deadline.
    pub fn with_verification_timeout(ports: HttpStatePorts, timeout: Duration) -> Self {
        let HttpStatePorts {
            identity,
            users,
            admins,
            sequence,
            blobs,
            items,
            purchases,
            payments,
            clock,
        } = ports;

        let entitlements = EntitlementResolver::new(blobs.clone(), purchases.clone());
        Self {
            verifier: CredentialVerifier::new(identity.clone(), clock.clone())
                .with_timeout(timeout),
            resolver: ProfileResolver::new(users.clone(), admins.clone()),
            registration: RegistrationService::new(
                users.clone(),
                admins,
                sequence,
                blobs.clone(),
                clock.clone(),
            ),
            accounts: AccountAdministration::new(
                users,
                items.clone(),
                purchases.clone(),
                identity,
                clock.clone(),
            ),
            catalogue: CatalogueService::new(
                items.clone(),
                blobs.clone(),
                entitlements,
                clock.clone(),
            ),
            purchases: PurchaseService::new(items, purchases, payments, clock),
            files: FileServingGateway::new(blobs.clone()),
            blobs,
        }
    }

    /// Public URL of a stored blob.
    pub fn media_url(&self, name: &BlobName) -> String {
        self.blobs.url_for(name)
    }
}
