//! Port for the external identity service.
//!
//! The identity service owns credential issuance and user-record storage. The
//! backend only asks it two things: who a bearer token belongs to, and for a
//! password-reset link on an administrator's behalf.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{BearerToken, IdentityClaim};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity service adapters.
    pub enum IdentityProviderError {
        /// The token is unknown, revoked or inactive.
        Rejected { message: String } => "identity service rejected the token: {message}",
        /// The identity service could not be reached or answered with a
        /// server error.
        Unavailable { message: String } => "identity service unavailable: {message}",
        /// The identity service did not answer in time.
        Timeout { message: String } => "identity service timed out: {message}",
        /// The reply could not be interpreted.
        InvalidResponse { message: String } => "identity service reply was invalid: {message}",
        /// No account exists for the requested email.
        UnknownAccount { email: String } => "no identity account for {email}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to its verified claim set.
    async fn introspect(&self, token: &BearerToken)
    -> Result<IdentityClaim, IdentityProviderError>;

    /// Ask the identity service for a password-reset link for `email`.
    async fn password_reset_link(&self, email: &str) -> Result<String, IdentityProviderError>;
}

/// In-process identity provider backed by a fixed token table.
///
/// Tokens not in the table are rejected, so an empty fixture treats every
/// caller as anonymous.
#[derive(Debug, Default, Clone)]
pub struct FixtureIdentityProvider {
    tokens: HashMap<String, IdentityClaim>,
}

impl FixtureIdentityProvider {
    /// Register `token` as belonging to `claim`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, claim: IdentityClaim) -> Self {
        self.tokens.insert(token.into(), claim);
        self
    }
}

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    async fn introspect(
        &self,
        token: &BearerToken,
    ) -> Result<IdentityClaim, IdentityProviderError> {
        self.tokens
            .get(token.expose())
            .cloned()
            .ok_or_else(|| IdentityProviderError::rejected("unknown token"))
    }

    async fn password_reset_link(&self, email: &str) -> Result<String, IdentityProviderError> {
        let known = self
            .tokens
            .values()
            .any(|claim| claim.email() == Some(email));
        if known {
            Ok(format!("https://identity.invalid/reset?email={email}"))
        } else {
            Err(IdentityProviderError::unknown_account(email))
        }
    }
}
