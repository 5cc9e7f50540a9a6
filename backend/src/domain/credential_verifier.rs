//! Bearer credential verification.
//!
//! Any identity-service failure (revoked, malformed, unreachable, slow) turns
//! into [`VerificationOutcome::Rejected`]. Nothing here returns an error: a
//! caller whose credential cannot be verified simply proceeds anonymously,
//! and endpoints that need a subject answer 401 on their own.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tracing::{debug, warn};

use super::ports::{IdentityProvider, IdentityProviderError};
use super::{BearerToken, RejectionReason, VerificationOutcome};

/// Upper bound on a single identity-service round trip.
pub const DEFAULT_VERIFICATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Verifies bearer credentials against the identity service.
#[derive(Clone)]
pub struct CredentialVerifier {
    provider: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl CredentialVerifier {
    pub fn new(provider: Arc<dyn IdentityProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            clock,
            timeout: DEFAULT_VERIFICATION_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Verify the raw `Authorization` header value, if any.
    pub async fn verify(&self, authorization: Option<&str>) -> VerificationOutcome {
        let Some(token) = authorization.and_then(BearerToken::from_authorization_header) else {
            return VerificationOutcome::Anonymous;
        };
        self.verify_token(&token).await
    }

    /// Verify an already-extracted bearer token.
    pub async fn verify_token(&self, token: &BearerToken) -> VerificationOutcome {
        let reply = tokio::time::timeout(self.timeout, self.provider.introspect(token)).await;
        let claim = match reply {
            Ok(Ok(claim)) => claim,
            Ok(Err(err)) => {
                let reason = rejection_reason(&err);
                warn!(reason = %reason, error = %err, "bearer credential rejected");
                return VerificationOutcome::Rejected(reason);
            }
            Err(_elapsed) => {
                warn!(
                    timeout_ms = self.timeout.as_millis(),
                    "identity service did not answer in time"
                );
                return VerificationOutcome::Rejected(RejectionReason::Timeout);
            }
        };

        if claim.is_expired_at(self.clock.utc()) {
            warn!(subject = %claim.subject(), "bearer credential expired");
            return VerificationOutcome::Rejected(RejectionReason::Expired);
        }

        debug!(subject = %claim.subject(), "bearer credential verified");
        VerificationOutcome::Authenticated(claim)
    }
}

const fn rejection_reason(err: &IdentityProviderError) -> RejectionReason {
    match err {
        IdentityProviderError::Rejected { .. } | IdentityProviderError::UnknownAccount { .. } => {
            RejectionReason::Revoked
        }
        IdentityProviderError::InvalidResponse { .. } => RejectionReason::Malformed,
        IdentityProviderError::Unavailable { .. } => RejectionReason::ProviderUnavailable,
        IdentityProviderError::Timeout { .. } => RejectionReason::Timeout,
    }
}
