//! Translation of port failures into domain errors.
//!
//! Connection failures surface as `service_unavailable`; query faults as
//! `internal_error` with the adapter message logged but not exposed.

use tracing::error;

use super::Error;
use super::ports::{
    BlobStoreError, ContentRepositoryError, IdentityProviderError, MemberSequenceError,
    PaymentVerifierError, ProfileRepositoryError, PurchaseRepositoryError,
};

impl From<ProfileRepositoryError> for Error {
    fn from(err: ProfileRepositoryError) -> Self {
        match err {
            ProfileRepositoryError::Connection { message } => {
                error!(%message, "profile store unreachable");
                Self::service_unavailable("profile store unavailable")
            }
            ProfileRepositoryError::Query { message } => {
                error!(%message, "profile store query failed");
                Self::internal("profile store query failed")
            }
            ProfileRepositoryError::Duplicate { field } => {
                Self::conflict(format!("a profile with this {field} already exists"))
                    .with_reason("duplicate")
                    .with_detail("field", field)
            }
        }
    }
}

impl From<BlobStoreError> for Error {
    fn from(err: BlobStoreError) -> Self {
        match err {
            BlobStoreError::Connection { message } => {
                error!(%message, "blob store unreachable");
                Self::service_unavailable("file storage unavailable")
            }
            BlobStoreError::Io { message } => {
                error!(%message, "blob store operation failed");
                Self::internal("file storage operation failed")
            }
            BlobStoreError::NamesExhausted { name } => {
                error!(%name, "no free blob name");
                Self::internal("could not allocate a file name")
            }
        }
    }
}

impl From<ContentRepositoryError> for Error {
    fn from(err: ContentRepositoryError) -> Self {
        match err {
            ContentRepositoryError::Connection { message } => {
                error!(%message, "content store unreachable");
                Self::service_unavailable("content store unavailable")
            }
            ContentRepositoryError::Query { message } => {
                error!(%message, "content store query failed");
                Self::internal("content store query failed")
            }
        }
    }
}

impl From<PurchaseRepositoryError> for Error {
    fn from(err: PurchaseRepositoryError) -> Self {
        match err {
            PurchaseRepositoryError::Connection { message } => {
                error!(%message, "purchase ledger unreachable");
                Self::service_unavailable("purchase ledger unavailable")
            }
            PurchaseRepositoryError::Query { message } => {
                error!(%message, "purchase ledger query failed");
                Self::internal("purchase ledger query failed")
            }
            PurchaseRepositoryError::Duplicate { item, .. } => {
                Self::conflict("item already purchased")
                    .with_reason("duplicate_purchase")
                    .with_detail("itemId", item)
            }
        }
    }
}

impl From<MemberSequenceError> for Error {
    fn from(err: MemberSequenceError) -> Self {
        match err {
            MemberSequenceError::Connection { message } => {
                error!(%message, "member sequence unreachable");
                Self::service_unavailable("member registry unavailable")
            }
            MemberSequenceError::Query { message } => {
                error!(%message, "member sequence allocation failed");
                Self::internal("member number allocation failed")
            }
        }
    }
}

impl From<PaymentVerifierError> for Error {
    fn from(err: PaymentVerifierError) -> Self {
        match err {
            PaymentVerifierError::Unavailable { message } => {
                error!(%message, "payment provider unreachable");
                Self::service_unavailable("payment provider unavailable")
            }
        }
    }
}

impl From<IdentityProviderError> for Error {
    fn from(err: IdentityProviderError) -> Self {
        match err {
            IdentityProviderError::UnknownAccount { .. } => {
                Self::not_found("no account with that email")
            }
            IdentityProviderError::Rejected { message }
            | IdentityProviderError::InvalidResponse { message } => {
                error!(%message, "identity service refused the request");
                Self::internal("identity service refused the request")
            }
            IdentityProviderError::Unavailable { message }
            | IdentityProviderError::Timeout { message } => {
                error!(%message, "identity service unreachable");
                Self::service_unavailable("identity service unavailable")
            }
        }
    }
}
