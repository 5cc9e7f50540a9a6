//! Reconciliation of verified identities with local profiles, and the
//! suspension gate that runs immediately afterwards.
//!
//! Lookup order is fixed: user profile, then administrator profile, then a
//! shadow identity with the student role and no persisted record. Resolution
//! only reads; creating profiles is the job of the registration service.

use std::sync::Arc;

use tracing::debug;

use super::ports::{AdminProfileRepository, UserProfileRepository};
use super::{Error, IdentityContext, VerificationOutcome};

/// Builds the request [`IdentityContext`] from a verification outcome.
#[derive(Clone)]
pub struct ProfileResolver {
    users: Arc<dyn UserProfileRepository>,
    admins: Arc<dyn AdminProfileRepository>,
}

impl ProfileResolver {
    pub fn new(
        users: Arc<dyn UserProfileRepository>,
        admins: Arc<dyn AdminProfileRepository>,
    ) -> Self {
        Self { users, admins }
    }

    /// Resolve the identity context for a request.
    ///
    /// Rejected and missing credentials both yield an anonymous context.
    ///
    /// # Errors
    /// Propagates profile store failures; a store outage never downgrades an
    /// authenticated caller to anonymous or upgrades their role.
    pub async fn resolve(&self, outcome: VerificationOutcome) -> Result<IdentityContext, Error> {
        let VerificationOutcome::Authenticated(claim) = outcome else {
            return Ok(IdentityContext::anonymous());
        };

        if let Some(profile) = self.users.find(claim.subject()).await? {
            debug!(subject = %claim.subject(), role = %profile.role, "resolved user profile");
            return Ok(IdentityContext::member(claim, profile));
        }
        if let Some(profile) = self.admins.find(claim.subject()).await? {
            debug!(subject = %claim.subject(), "resolved administrator profile");
            return Ok(IdentityContext::administrator(claim, profile));
        }
        debug!(subject = %claim.subject(), "no local profile; using shadow identity");
        Ok(IdentityContext::shadow(claim))
    }
}

/// Reason attached to suspension denials.
pub const SUSPENDED_REASON: &str = "suspended";

/// Outcome of the suspension gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny { reason: &'static str },
}

/// Deny suspended members before any handler runs.
///
/// Only a found user profile with the suspension flag set is denied;
/// administrators, shadow identities and anonymous callers pass.
///
/// # Examples
/// ```
/// use library_backend::domain::{GateDecision, IdentityContext, check_suspension};
///
/// assert_eq!(check_suspension(&IdentityContext::anonymous()), GateDecision::Allow);
/// ```
#[must_use]
pub fn check_suspension(ctx: &IdentityContext) -> GateDecision {
    if ctx.is_suspended() {
        GateDecision::Deny {
            reason: SUSPENDED_REASON,
        }
    } else {
        GateDecision::Allow
    }
}
