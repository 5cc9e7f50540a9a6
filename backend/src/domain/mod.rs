//! Domain primitives, services and ports.
//!
//! Purpose: hold every access-control decision independent of transport and
//! storage. Inbound adapters build an [`IdentityContext`] once per request and
//! hand it to the services here; outbound adapters implement [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - CredentialVerifier, ProfileResolver, check_suspension: request identity.
//! - EntitlementResolver, FileServingGateway: content access and delivery.
//! - RegistrationService, AccountAdministration, CatalogueService,
//!   PurchaseService: state-changing workflows.

pub mod account_admin;
pub mod blob;
pub mod catalogue;
pub mod content;
pub mod credential_verifier;
pub mod entitlement;
pub mod error;
pub mod file_serving;
pub mod identity;
pub mod identity_context;
mod port_error_mapping;
pub mod ports;
pub mod profile;
pub mod profile_resolver;
pub mod purchases;
pub mod registration;
#[cfg(test)]
mod test_support;
pub mod trace_id;
pub mod upload_policy;

pub use self::account_admin::{
    AccountAdministration, AccountUpdate, MemberDetails, ProofReview, require_admin,
};
pub use self::blob::{
    BLOB_NAME_MAX, BlobMetadata, BlobName, BlobNameError, MAX_NAME_ATTEMPTS, MediaLocator,
    safe_segment,
};
pub use self::catalogue::{CatalogueService, ItemUpload, ItemView, NewContentItem};
pub use self::content::{
    AccessDecision, AccessReason, ContentItem, ContentItemId, ItemFile, ItemFilter, LibraryEntry,
    PaymentConfirmation, Price, Purchase, PurchaseLine,
};
pub use self::credential_verifier::{CredentialVerifier, DEFAULT_VERIFICATION_TIMEOUT};
pub use self::entitlement::EntitlementResolver;
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::file_serving::{Disposition, FileServingGateway, ServedFile, content_type_for};
pub use self::identity::{
    BearerToken, IdentityClaim, IdentityValidationError, RejectionReason, SubjectId,
    VerificationOutcome,
};
pub use self::identity_context::{IdentityContext, Principal};
pub use self::profile::{
    AdminProfile, Department, MemberEdit, MemberFilter, MemberId, ProfileRecord,
    ProfileValidationError, ProofDocument, ProofFilter, ProofStatus, Role, UNKNOWN_DISPLAY_NAME,
    UnknownProofFilter, UnknownRole, UserProfile,
};
pub use self::profile_resolver::{GateDecision, ProfileResolver, SUSPENDED_REASON, check_suspension};
pub use self::purchases::PurchaseService;
pub use self::registration::{
    AdminRegistration, CompletedProfile, PROFILE_NOT_SYNCHRONISED, ProfileCompletion,
    ProofReceipt, ProofUpload, RegistrationService, UserRegistration, profile_not_synchronised,
};
pub use self::trace_id::TraceId;
pub use self::upload_policy::{
    CheckedUpload, UploadKind, UploadRejection, check_upload, stored_name_for,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use library_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
