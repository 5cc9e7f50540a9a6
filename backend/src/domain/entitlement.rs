//! Per-item access decisions.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. an authenticated caller without a user profile, or whose profile has
//!    no stored proof-of-eligibility file, is refused with
//!    `missing_id_proof`, whatever the item;
//! 2. a non-premium item is allowed as `free`;
//! 3. a recorded purchase allows the item as `purchased`;
//! 4. anything else is refused as `not-purchased`.
//!
//! Anonymous callers skip rule 1. Refusals are ordinary decisions, not
//! errors.

use std::sync::Arc;

use tracing::debug;

use super::ports::{BlobStore, PurchaseRepository};
use super::{AccessDecision, AccessReason, ContentItem, Error, IdentityContext};

/// Evaluates the ordered access policy.
#[derive(Clone)]
pub struct EntitlementResolver {
    blobs: Arc<dyn BlobStore>,
    purchases: Arc<dyn PurchaseRepository>,
}

impl EntitlementResolver {
    pub fn new(blobs: Arc<dyn BlobStore>, purchases: Arc<dyn PurchaseRepository>) -> Self {
        Self { blobs, purchases }
    }

    /// Decide whether `ctx` may access `item`.
    ///
    /// # Errors
    /// Only store failures are errors.
    pub async fn check_access(
        &self,
        ctx: &IdentityContext,
        item: &ContentItem,
    ) -> Result<AccessDecision, Error> {
        if ctx.is_authenticated() && !self.has_stored_proof(ctx).await? {
            debug!(item = %item.id, subject = ?ctx.subject(), "access refused: no proof on file");
            return Ok(AccessDecision::deny(AccessReason::MissingIdProof));
        }

        if !item.premium {
            return Ok(AccessDecision::allow(AccessReason::Free));
        }

        let Some(subject) = ctx.subject() else {
            return Ok(AccessDecision::deny(AccessReason::NotPurchased));
        };
        if self.purchases.exists(subject, item.id).await? {
            Ok(AccessDecision::allow(AccessReason::Purchased))
        } else {
            Ok(AccessDecision::deny(AccessReason::NotPurchased))
        }
    }

    /// A profile reference counts only if the blob store still holds it.
    async fn has_stored_proof(&self, ctx: &IdentityContext) -> Result<bool, Error> {
        let Some(file) = ctx
            .user_profile()
            .and_then(|profile| profile.proof.file.as_ref())
        else {
            return Ok(false);
        };
        Ok(self.blobs.exists(file).await?)
    }
}
