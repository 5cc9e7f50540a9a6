//! Wire shapes of the identity service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{IdentityClaim, SubjectId};

/// Token introspection reply (RFC 7662 subset).
#[derive(Debug, Deserialize)]
pub(super) struct IntrospectionDto {
    #[serde(default)]
    pub(super) active: bool,
    pub(super) sub: Option<String>,
    pub(super) name: Option<String>,
    pub(super) email: Option<String>,
    pub(super) iat: Option<i64>,
    pub(super) exp: Option<i64>,
}

impl IntrospectionDto {
    /// Map an active reply onto a claim.
    ///
    /// Callers check `active` first.
    pub(super) fn into_claim(self) -> Result<IdentityClaim, String> {
        let raw_subject = self
            .sub
            .ok_or_else(|| "active token without a subject".to_owned())?;
        let subject = SubjectId::new(raw_subject).map_err(|err| err.to_string())?;
        let mut claim = IdentityClaim::new(subject)
            .with_validity(timestamp(self.iat)?, timestamp(self.exp)?);
        if let Some(name) = self.name {
            claim = claim.with_display_name(name);
        }
        if let Some(email) = self.email {
            claim = claim.with_email(email);
        }
        Ok(claim)
    }
}

fn timestamp(seconds: Option<i64>) -> Result<Option<DateTime<Utc>>, String> {
    seconds
        .map(|value| {
            DateTime::from_timestamp(value, 0).ok_or_else(|| format!("timestamp {value} out of range"))
        })
        .transpose()
}

#[derive(Debug, Serialize)]
pub(super) struct PasswordResetRequestDto<'a> {
    pub(super) email: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct PasswordResetReplyDto {
    pub(super) link: String,
}
