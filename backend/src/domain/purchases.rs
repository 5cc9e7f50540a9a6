//! Recording purchases of premium items and listing what members own.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::ports::{ContentRepository, PaymentVerifier, PurchaseRepository};
use super::{
    AccessReason, ContentItemId, Error, IdentityContext, ItemFilter, LibraryEntry,
    PaymentConfirmation, Purchase, PurchaseLine, SubjectId,
};

/// Confirms payments and writes purchase records.
#[derive(Clone)]
pub struct PurchaseService {
    items: Arc<dyn ContentRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    payments: Arc<dyn PaymentVerifier>,
    clock: Arc<dyn Clock>,
}

impl PurchaseService {
    pub fn new(
        items: Arc<dyn ContentRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        payments: Arc<dyn PaymentVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            items,
            purchases,
            payments,
            clock,
        }
    }

    /// Record that the caller bought `item` once the payment checks out.
    ///
    /// # Errors
    /// `unauthorized` for anonymous callers, `forbidden` without a member
    /// record, `invalid_request` for missing or unverified payment details,
    /// `not_found` for unknown items, `conflict` when already bought.
    pub async fn record_purchase(
        &self,
        ctx: &IdentityContext,
        item: ContentItemId,
        payment: PaymentConfirmation,
    ) -> Result<Purchase, Error> {
        if !ctx.is_authenticated() {
            return Err(Error::unauthorized("authentication required"));
        }
        let Some(profile) = ctx.user_profile() else {
            return Err(Error::forbidden("purchases require a member profile"));
        };
        if payment.payment_id.trim().is_empty() || payment.order_id.trim().is_empty() {
            return Err(Error::invalid_request("missing payment details")
                .with_reason("missing_payment_details"));
        }

        let Some(content) = self.items.find(item).await? else {
            return Err(Error::not_found("book not found")
                .with_reason("not_found"));
        };
        if !self.payments.verify(&payment).await? {
            warn!(subject = %profile.subject, item = %item, "payment verification failed");
            return Err(Error::invalid_request("payment could not be verified")
                .with_reason("payment_not_verified"));
        }

        let purchase = Purchase {
            subject: profile.subject.clone(),
            item,
            amount: content.price,
            purchased_at: self.clock.utc(),
            transaction_ref: Some(payment.payment_id),
        };
        self.purchases.record(&purchase).await?;
        info!(subject = %purchase.subject, item = %item, "purchase recorded");
        Ok(purchase)
    }

    /// The caller's purchases, most recent first.
    ///
    /// # Errors
    /// `unauthorized` for anonymous callers.
    pub async fn purchase_history(&self, ctx: &IdentityContext) -> Result<Vec<PurchaseLine>, Error> {
        let subject = signed_in(ctx)?;
        purchase_lines(self.items.as_ref(), self.purchases.as_ref(), subject).await
    }

    /// Every item the caller may read: all free items, then the premium
    /// items they bought.
    ///
    /// # Errors
    /// `unauthorized` for anonymous callers.
    pub async fn library(&self, ctx: &IdentityContext) -> Result<Vec<LibraryEntry>, Error> {
        let subject = signed_in(ctx)?;
        let free = self
            .items
            .list(&ItemFilter {
                premium: Some(false),
                ..ItemFilter::default()
            })
            .await?;
        let mut library: Vec<LibraryEntry> = free
            .into_iter()
            .map(|item| LibraryEntry {
                item,
                access: AccessReason::Free,
            })
            .collect();

        let owned = purchase_lines(self.items.as_ref(), self.purchases.as_ref(), subject).await?;
        for item in owned.into_iter().filter_map(|line| line.item) {
            if library.iter().any(|entry| entry.item.id == item.id) {
                continue;
            }
            library.push(LibraryEntry {
                item,
                access: AccessReason::Purchased,
            });
        }
        Ok(library)
    }
}

fn signed_in(ctx: &IdentityContext) -> Result<&SubjectId, Error> {
    ctx.subject()
        .ok_or_else(|| Error::unauthorized("authentication required"))
}

/// Purchases of `subject` joined with their items. Items deleted since the
/// purchase come back as `None`.
pub(crate) async fn purchase_lines(
    items: &dyn ContentRepository,
    purchases: &dyn PurchaseRepository,
    subject: &SubjectId,
) -> Result<Vec<PurchaseLine>, Error> {
    let bought = purchases.list_for(subject).await?;
    let mut lines = Vec::with_capacity(bought.len());
    for purchase in bought {
        let item = items.find(purchase.item).await?;
        lines.push(PurchaseLine { purchase, item });
    }
    Ok(lines)
}
