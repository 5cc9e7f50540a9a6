//! Port for the purchase ledger.
//!
//! A `(subject, item)` pair is unique; recording it twice yields
//! [`PurchaseRepositoryError::Duplicate`].

use async_trait::async_trait;

use crate::domain::{ContentItemId, Purchase, SubjectId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by purchase ledger adapters.
    pub enum PurchaseRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "purchase ledger connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "purchase ledger query failed: {message}",
        /// The subject already bought this item.
        Duplicate { subject: String, item: String } =>
            "{subject} already purchased {item}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Whether `subject` bought `item`.
    async fn exists(
        &self,
        subject: &SubjectId,
        item: ContentItemId,
    ) -> Result<bool, PurchaseRepositoryError>;

    /// Purchases made by `subject`, most recent first.
    async fn list_for(&self, subject: &SubjectId) -> Result<Vec<Purchase>, PurchaseRepositoryError>;

    /// Append a purchase to the ledger.
    async fn record(&self, purchase: &Purchase) -> Result<(), PurchaseRepositoryError>;
}
