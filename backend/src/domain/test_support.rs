//! Shared helpers for domain unit tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use super::{
    AdminProfile, BlobName, IdentityClaim, IdentityContext, ProofDocument, SubjectId, UserProfile,
};

pub(crate) fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub(crate) struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Default for FixtureClock {
    fn default() -> Self {
        Self {
            utc_now: fixture_now(),
        }
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock::default())
}

pub(crate) fn subject(raw: &str) -> SubjectId {
    SubjectId::new(raw).expect("valid subject")
}

pub(crate) fn claim(raw: &str) -> IdentityClaim {
    IdentityClaim::new(subject(raw))
}

pub(crate) fn member_profile(raw: &str) -> UserProfile {
    UserProfile::new(subject(raw), fixture_now())
}

pub(crate) fn member_with_proof(raw: &str, proof: &str) -> UserProfile {
    let mut profile = member_profile(raw);
    profile.proof = ProofDocument {
        file: Some(BlobName::new(proof).expect("valid proof name")),
        uploaded_at: Some(fixture_now()),
        ..ProofDocument::default()
    };
    profile
}

pub(crate) fn admin_profile(raw: &str) -> AdminProfile {
    AdminProfile {
        subject: subject(raw),
        email: format!("{raw}@example.edu"),
        display_name: "Admin".to_owned(),
        elevation_key_used: None,
        created_at: fixture_now(),
    }
}

pub(crate) fn member_context(profile: UserProfile) -> IdentityContext {
    IdentityContext::member(IdentityClaim::new(profile.subject.clone()), profile)
}

pub(crate) fn admin_context(raw: &str) -> IdentityContext {
    IdentityContext::administrator(claim(raw), admin_profile(raw))
}
