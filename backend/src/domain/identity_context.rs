//! Request-scoped identity context.
//!
//! Built once per request from the verification outcome and the resolved
//! profile, then shared read-only by the suspension gate, the entitlement
//! resolver and handlers.

use super::{AdminProfile, Department, IdentityClaim, Role, SubjectId, UserProfile};

/// Who is calling, as far as the backend can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// No credential, or a credential that failed verification.
    Anonymous,
    /// Verified subject without any local profile.
    Shadow(IdentityClaim),
    /// Verified subject with a user profile.
    Member {
        claim: IdentityClaim,
        profile: UserProfile,
    },
    /// Verified subject with an administrator profile.
    Administrator {
        claim: IdentityClaim,
        profile: AdminProfile,
    },
}

/// Immutable identity context for a single request.
///
/// Profile attributes take precedence over claim attributes; the role is
/// never taken from the claim.
///
/// # Examples
/// ```
/// use library_backend::domain::{IdentityClaim, IdentityContext, Role, SubjectId};
///
/// let claim = IdentityClaim::new(SubjectId::new("uid-1").unwrap());
/// let ctx = IdentityContext::shadow(claim);
/// assert_eq!(ctx.role(), Some(Role::Student));
/// assert!(ctx.user_profile().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    principal: Principal,
}

impl IdentityContext {
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            principal: Principal::Anonymous,
        }
    }

    #[must_use]
    pub const fn shadow(claim: IdentityClaim) -> Self {
        Self {
            principal: Principal::Shadow(claim),
        }
    }

    #[must_use]
    pub const fn member(claim: IdentityClaim, profile: UserProfile) -> Self {
        Self {
            principal: Principal::Member { claim, profile },
        }
    }

    #[must_use]
    pub const fn administrator(claim: IdentityClaim, profile: AdminProfile) -> Self {
        Self {
            principal: Principal::Administrator { claim, profile },
        }
    }

    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Verified subject, absent for anonymous callers.
    #[must_use]
    pub fn subject(&self) -> Option<&SubjectId> {
        self.claim().map(IdentityClaim::subject)
    }

    #[must_use]
    pub const fn claim(&self) -> Option<&IdentityClaim> {
        match &self.principal {
            Principal::Anonymous => None,
            Principal::Shadow(claim)
            | Principal::Member { claim, .. }
            | Principal::Administrator { claim, .. } => Some(claim),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        !matches!(self.principal, Principal::Anonymous)
    }

    /// Effective role; shadow identities default to [`Role::Student`].
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        match &self.principal {
            Principal::Anonymous => None,
            Principal::Shadow(_) => Some(Role::Student),
            Principal::Member { profile, .. } => Some(profile.role),
            Principal::Administrator { .. } => Some(Role::Admin),
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.principal, Principal::Administrator { .. })
    }

    #[must_use]
    pub const fn user_profile(&self) -> Option<&UserProfile> {
        match &self.principal {
            Principal::Member { profile, .. } => Some(profile),
            Principal::Anonymous | Principal::Shadow(_) | Principal::Administrator { .. } => None,
        }
    }

    #[must_use]
    pub const fn admin_profile(&self) -> Option<&AdminProfile> {
        match &self.principal {
            Principal::Administrator { profile, .. } => Some(profile),
            Principal::Anonymous | Principal::Shadow(_) | Principal::Member { .. } => None,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match &self.principal {
            Principal::Anonymous => None,
            Principal::Shadow(claim) => claim.display_name(),
            Principal::Member { profile, .. } => Some(profile.display_name.as_str()),
            Principal::Administrator { profile, .. } => Some(profile.display_name.as_str()),
        }
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        match &self.principal {
            Principal::Anonymous => None,
            Principal::Shadow(claim) => claim.email(),
            Principal::Member { claim, profile } => profile.email.as_deref().or(claim.email()),
            Principal::Administrator { profile, .. } => Some(profile.email.as_str()),
        }
    }

    #[must_use]
    pub fn department(&self) -> Option<&Department> {
        self.user_profile()
            .and_then(|profile| profile.department.as_ref())
    }

    #[must_use]
    pub fn semester(&self) -> Option<&str> {
        self.user_profile()
            .and_then(|profile| profile.semester.as_deref())
    }

    /// Whether the caller is a suspended member.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.user_profile().is_some_and(UserProfile::is_suspended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::{fixture, rstest};

    #[fixture]
    fn claim() -> IdentityClaim {
        IdentityClaim::new(SubjectId::new("uid-7").expect("subject"))
            .with_display_name("Claim Name")
            .with_email("claim@example.edu")
    }

    #[rstest]
    fn anonymous_has_no_subject_or_role() {
        let ctx = IdentityContext::anonymous();
        assert!(ctx.subject().is_none());
        assert!(ctx.role().is_none());
        assert!(!ctx.is_authenticated());
    }

    #[rstest]
    fn member_attributes_take_precedence(claim: IdentityClaim) {
        let mut profile = UserProfile::new(claim.subject().clone(), Utc::now());
        profile.display_name = "Profile Name".to_owned();
        profile.role = Role::Faculty;
        profile.email = Some("profile@example.edu".to_owned());
        let ctx = IdentityContext::member(claim, profile);

        assert_eq!(ctx.role(), Some(Role::Faculty));
        assert_eq!(ctx.display_name(), Some("Profile Name"));
        assert_eq!(ctx.email(), Some("profile@example.edu"));
    }

    #[rstest]
    fn member_falls_back_to_claim_email(claim: IdentityClaim) {
        let profile = UserProfile::new(claim.subject().clone(), Utc::now());
        let ctx = IdentityContext::member(claim, profile);
        assert_eq!(ctx.email(), Some("claim@example.edu"));
    }

    #[rstest]
    fn administrators_are_never_suspended(claim: IdentityClaim) {
        let profile = AdminProfile {
            subject: claim.subject().clone(),
            email: "admin@example.edu".to_owned(),
            display_name: "Admin".to_owned(),
            elevation_key_used: None,
            created_at: Utc::now(),
        };
        let ctx = IdentityContext::administrator(claim, profile);
        assert!(ctx.is_admin());
        assert!(!ctx.is_suspended());
        assert_eq!(ctx.role(), Some(Role::Admin));
    }
}
