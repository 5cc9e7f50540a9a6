//! Identity primitives produced by bearer-credential verification.
//!
//! A request carries at most one bearer credential. Verifying it against the
//! identity service yields a [`VerificationOutcome`]; only the
//! [`VerificationOutcome::Authenticated`] variant carries an
//! [`IdentityClaim`], and claims are immutable once produced.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Maximum accepted length of a subject identifier.
pub const SUBJECT_ID_MAX: usize = 128;

/// Validation errors for identity primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityValidationError {
    /// Subject identifier was blank.
    EmptySubject,
    /// Subject identifier exceeded [`SUBJECT_ID_MAX`] characters.
    SubjectTooLong { max: usize },
    /// Subject identifier contained whitespace, control characters or `/`.
    InvalidSubjectCharacters,
}

impl fmt::Display for IdentityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySubject => write!(f, "subject identifier must not be empty"),
            Self::SubjectTooLong { max } => {
                write!(f, "subject identifier must be at most {max} characters")
            }
            Self::InvalidSubjectCharacters => write!(
                f,
                "subject identifier must not contain whitespace, control characters or '/'",
            ),
        }
    }
}

impl std::error::Error for IdentityValidationError {}

/// Opaque, stable subject identifier issued by the identity service.
///
/// The same identifier space keys both user and administrator profiles.
///
/// # Examples
/// ```
/// use library_backend::domain::SubjectId;
///
/// let subject = SubjectId::new("uid-123").expect("valid subject");
/// assert_eq!(subject.as_ref(), "uid-123");
/// assert!(SubjectId::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    /// Validate and construct a subject identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(IdentityValidationError::EmptySubject);
        }
        if raw.chars().count() > SUBJECT_ID_MAX {
            return Err(IdentityValidationError::SubjectTooLong {
                max: SUBJECT_ID_MAX,
            });
        }
        if raw
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '/')
        {
            return Err(IdentityValidationError::InvalidSubjectCharacters);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for SubjectId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SubjectId> for String {
    fn from(value: SubjectId) -> Self {
        value.0
    }
}

impl TryFrom<String> for SubjectId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Bearer credential extracted from an `Authorization` header.
///
/// The token is zeroised on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(Zeroizing<String>);

impl BearerToken {
    const SCHEME: &'static str = "Bearer ";

    /// Parse an `Authorization` header value of the form `Bearer <token>`.
    ///
    /// Returns `None` for any other scheme or a blank token.
    ///
    /// # Examples
    /// ```
    /// use library_backend::domain::BearerToken;
    ///
    /// assert!(BearerToken::from_authorization_header("Bearer abc").is_some());
    /// assert!(BearerToken::from_authorization_header("Basic abc").is_none());
    /// assert!(BearerToken::from_authorization_header("Bearer   ").is_none());
    /// ```
    #[must_use]
    pub fn from_authorization_header(value: &str) -> Option<Self> {
        let token = value.strip_prefix(Self::SCHEME)?.trim();
        if token.is_empty() {
            return None;
        }
        Some(Self(Zeroizing::new(token.to_owned())))
    }

    /// Wrap an already-extracted token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// Expose the raw token for transmission to the identity service.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Verified claim set returned by the identity service.
///
/// # Examples
/// ```
/// use library_backend::domain::{IdentityClaim, SubjectId};
///
/// let claim = IdentityClaim::new(SubjectId::new("uid-1").unwrap())
///     .with_display_name("Ada")
///     .with_email("ada@example.edu");
/// assert_eq!(claim.email(), Some("ada@example.edu"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    subject: SubjectId,
    display_name: Option<String>,
    email: Option<String>,
    issued_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

impl IdentityClaim {
    /// Build a claim carrying only the subject identifier.
    #[must_use]
    pub const fn new(subject: SubjectId) -> Self {
        Self {
            subject,
            display_name: None,
            email: None,
            issued_at: None,
            expires_at: None,
        }
    }

    /// Attach a display name; blank values are ignored.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = non_blank(name.into());
        self
    }

    /// Attach an email address; blank values are ignored.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = non_blank(email.into());
        self
    }

    /// Attach token issue and expiry timestamps.
    #[must_use]
    pub const fn with_validity(
        mut self,
        issued_at: Option<DateTime<Utc>>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.issued_at = issued_at;
        self.expires_at = expires_at;
        self
    }

    #[must_use]
    pub const fn subject(&self) -> &SubjectId {
        &self.subject
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub const fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the token expired at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Why a presented credential was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// The identity service reported the token as inactive or revoked.
    Revoked,
    /// The token's expiry lies in the past.
    Expired,
    /// The identity service could not interpret the token or its reply.
    Malformed,
    /// The identity service could not be reached.
    ProviderUnavailable,
    /// The identity service did not answer within the configured bound.
    Timeout,
}

impl RejectionReason {
    /// Stable label used in structured logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revoked => "revoked",
            Self::Expired => "expired",
            Self::Malformed => "malformed",
            Self::ProviderUnavailable => "provider_unavailable",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of verifying the credential attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// A credential was presented and accepted.
    Authenticated(IdentityClaim),
    /// No credential was presented.
    Anonymous,
    /// A credential was presented but could not be verified.
    Rejected(RejectionReason),
}

impl VerificationOutcome {
    /// Claim for authenticated outcomes.
    #[must_use]
    pub const fn claim(&self) -> Option<&IdentityClaim> {
        match self {
            Self::Authenticated(claim) => Some(claim),
            Self::Anonymous | Self::Rejected(_) => None,
        }
    }
}
