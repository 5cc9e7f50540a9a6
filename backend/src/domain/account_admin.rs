//! Administrator operations on member accounts.

use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use tracing::info;

use super::ports::{
    ContentRepository, IdentityProvider, PurchaseRepository, UserProfileRepository,
};
use super::purchases::purchase_lines;
use super::{
    Error, IdentityContext, MemberEdit, MemberFilter, MemberId, ProofStatus, PurchaseLine, Role,
    SubjectId, UserProfile,
};

/// Acknowledgement returned by account mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountUpdate {
    pub success: bool,
    pub message: String,
}

impl AccountUpdate {
    fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Verdict on a member's proof document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofReview {
    Verified,
    Rejected { reason: String },
}

/// A member record with its purchase history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDetails {
    pub profile: UserProfile,
    pub purchases: Vec<PurchaseLine>,
}

/// Member listing, edits, suspension, proof review and password resets.
#[derive(Clone)]
pub struct AccountAdministration {
    users: Arc<dyn UserProfileRepository>,
    items: Arc<dyn ContentRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
}

impl AccountAdministration {
    pub fn new(
        users: Arc<dyn UserProfileRepository>,
        items: Arc<dyn ContentRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            items,
            purchases,
            identity,
            clock,
        }
    }

    /// Members matching `filter`, newest first.
    ///
    /// # Errors
    /// `unauthorized`/`forbidden` for non-administrators.
    pub async fn list_members(
        &self,
        actor: &IdentityContext,
        filter: &MemberFilter,
    ) -> Result<Vec<UserProfile>, Error> {
        require_admin(actor)?;
        Ok(self.users.list(filter).await?)
    }

    /// Look a member up by subject, falling back to their member identifier,
    /// and attach their purchases.
    ///
    /// # Errors
    /// `unauthorized`/`forbidden` for non-administrators, `not_found` when
    /// neither key matches.
    pub async fn member_details(
        &self,
        actor: &IdentityContext,
        key: &str,
    ) -> Result<MemberDetails, Error> {
        require_admin(actor)?;
        let by_subject = match SubjectId::new(key) {
            Ok(subject) => self.users.find(&subject).await?,
            Err(_) => None,
        };
        let profile = match by_subject {
            Some(profile) => profile,
            None => {
                let Ok(member_id) = MemberId::new(key) else {
                    return Err(member_not_found());
                };
                self.users
                    .find_by_member_id(&member_id)
                    .await?
                    .ok_or_else(member_not_found)?
            }
        };
        let purchases =
            purchase_lines(self.items.as_ref(), self.purchases.as_ref(), &profile.subject).await?;
        Ok(MemberDetails { profile, purchases })
    }

    /// Change a member's descriptive fields.
    ///
    /// # Errors
    /// `unauthorized`/`forbidden` for non-administrators, `invalid_request`
    /// for a blank name or an administrator role, `not_found` when the
    /// member does not exist.
    pub async fn update_member(
        &self,
        actor: &IdentityContext,
        subject: &SubjectId,
        mut edit: MemberEdit,
    ) -> Result<UserProfile, Error> {
        require_admin(actor)?;
        if edit.role == Some(Role::Admin) {
            return Err(Error::invalid_request(
                "role must be student, faculty or alumni",
            ));
        }
        edit.display_name = edit
            .display_name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        edit.mobile = edit.mobile.map(|mobile| mobile.trim().to_owned());

        let Some(profile) = self.users.update_details(subject, &edit).await? else {
            return Err(member_not_found());
        };
        info!(subject = %subject, actor = ?actor.subject(), "member details updated");
        Ok(profile)
    }

    /// Suspend or reactivate a member.
    ///
    /// # Errors
    /// `unauthorized`/`forbidden` for non-administrators, `not_found` when
    /// the member does not exist.
    pub async fn set_suspension(
        &self,
        actor: &IdentityContext,
        subject: &SubjectId,
        suspended: bool,
    ) -> Result<AccountUpdate, Error> {
        require_admin(actor)?;
        let suspended_at = suspended.then(|| self.clock.utc());
        let Some(profile) = self.users.set_suspension(subject, suspended_at).await? else {
            return Err(member_not_found());
        };

        let verb = if profile.is_suspended() {
            "suspended"
        } else {
            "activated"
        };
        info!(subject = %subject, actor = ?actor.subject(), verb, "member suspension changed");
        Ok(AccountUpdate::done(format!("User {verb} successfully")))
    }

    /// Record the outcome of a proof document review.
    ///
    /// # Errors
    /// `unauthorized`/`forbidden` for non-administrators, `not_found` when
    /// the member does not exist.
    pub async fn review_proof(
        &self,
        actor: &IdentityContext,
        subject: &SubjectId,
        review: ProofReview,
    ) -> Result<(UserProfile, AccountUpdate), Error> {
        require_admin(actor)?;
        let now = self.clock.utc();
        let (status, verb) = match review {
            ProofReview::Verified => (ProofStatus::Verified { verified_at: now }, "verified"),
            ProofReview::Rejected { reason } => (
                ProofStatus::Rejected {
                    reason: reason.trim().to_owned(),
                    rejected_at: now,
                },
                "rejected",
            ),
        };
        let Some(profile) = self.users.set_proof_status(subject, &status).await? else {
            return Err(member_not_found());
        };

        info!(subject = %subject, verb, "proof document reviewed");
        Ok((profile, AccountUpdate::done(format!("ID proof {verb} successfully"))))
    }

    /// Ask the identity service for a password reset link.
    ///
    /// # Errors
    /// `invalid_request` for a blank email, `not_found` when the identity
    /// service has no such account.
    pub async fn issue_password_reset(
        &self,
        actor: &IdentityContext,
        email: &str,
    ) -> Result<String, Error> {
        require_admin(actor)?;
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::invalid_request("email is required"));
        }
        let link = self.identity.password_reset_link(email).await?;
        info!(actor = ?actor.subject(), "password reset link issued");
        Ok(link)
    }
}

/// Refuse anyone but an administrator.
///
/// # Errors
/// `unauthorized` for anonymous callers, `forbidden` for everyone else.
pub fn require_admin(ctx: &IdentityContext) -> Result<(), Error> {
    if !ctx.is_authenticated() {
        return Err(Error::unauthorized("authentication required"));
    }
    if !ctx.is_admin() {
        return Err(Error::forbidden("administrator role required"));
    }
    Ok(())
}

fn member_not_found() -> Error {
    Error::not_found("user not found").with_reason("not_found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{
        IdentityProviderError, MockContentRepository, MockIdentityProvider,
        MockPurchaseRepository, MockUserProfileRepository,
    };
    use crate::domain::test_support::{
        admin_context, claim, fixture_clock, fixture_now, member_context, member_profile, subject,
    };
    use rstest::rstest;

    fn service(
        users: MockUserProfileRepository,
        identity: MockIdentityProvider,
    ) -> AccountAdministration {
        AccountAdministration::new(
            Arc::new(users),
            Arc::new(MockContentRepository::new()),
            Arc::new(MockPurchaseRepository::new()),
            Arc::new(identity),
            fixture_clock(),
        )
    }

    #[rstest]
    #[case(true, "User suspended successfully")]
    #[case(false, "User activated successfully")]
    #[tokio::test]
    async fn toggles_suspension(#[case] suspended: bool, #[case] message: &str) {
        let mut users = MockUserProfileRepository::new();
        users
            .expect_set_suspension()
            .withf(move |_, at| at.is_some() == suspended)
            .times(1)
            .returning(|raw, at| {
                let mut profile = member_profile(raw.as_ref());
                profile.suspended_at = at;
                Ok(Some(profile))
            });

        let update = service(users, MockIdentityProvider::new())
            .set_suspension(&admin_context("boss"), &subject("uid-1"), suspended)
            .await
            .expect("updated");
        assert_eq!(update, AccountUpdate::done(message));
    }

    #[tokio::test]
    async fn suspending_unknown_member_is_not_found() {
        let mut users = MockUserProfileRepository::new();
        users.expect_set_suspension().returning(|_, _| Ok(None));
        let err = service(users, MockIdentityProvider::new())
            .set_suspension(&admin_context("boss"), &subject("ghost"), true)
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[case(IdentityContext::anonymous(), ErrorCode::Unauthorized)]
    #[case(IdentityContext::shadow(claim("uid-2")), ErrorCode::Forbidden)]
    #[case(member_context(member_profile("uid-2")), ErrorCode::Forbidden)]
    #[tokio::test]
    async fn non_admins_cannot_suspend(#[case] actor: IdentityContext, #[case] code: ErrorCode) {
        let mut users = MockUserProfileRepository::new();
        users.expect_set_suspension().never();
        let err = service(users, MockIdentityProvider::new())
            .set_suspension(&actor, &subject("uid-1"), true)
            .await
            .expect_err("refused");
        assert_eq!(err.code(), code);
    }

    #[tokio::test]
    async fn verified_review_stamps_time() {
        let mut users = MockUserProfileRepository::new();
        users
            .expect_set_proof_status()
            .withf(|_, status| {
                *status
                    == ProofStatus::Verified {
                        verified_at: fixture_now(),
                    }
            })
            .returning(|raw, status| {
                let mut profile = member_profile(raw.as_ref());
                profile.proof.status = status.clone();
                Ok(Some(profile))
            });

        let (profile, update) = service(users, MockIdentityProvider::new())
            .review_proof(&admin_context("boss"), &subject("uid-1"), ProofReview::Verified)
            .await
            .expect("reviewed");
        assert_eq!(update.message, "ID proof verified successfully");
        assert!(matches!(profile.proof.status, ProofStatus::Verified { .. }));
    }

    #[tokio::test]
    async fn rejected_review_records_reason() {
        let mut users = MockUserProfileRepository::new();
        users
            .expect_set_proof_status()
            .withf(|_, status| {
                matches!(status, ProofStatus::Rejected { reason, .. } if reason == "blurry")
            })
            .returning(|raw, _| Ok(Some(member_profile(raw.as_ref()))));

        let (_, update) = service(users, MockIdentityProvider::new())
            .review_proof(
                &admin_context("boss"),
                &subject("uid-1"),
                ProofReview::Rejected {
                    reason: " blurry ".to_owned(),
                },
            )
            .await
            .expect("reviewed");
        assert_eq!(update.message, "ID proof rejected successfully");
    }

    #[tokio::test]
    async fn password_reset_delegates_to_identity_service() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_password_reset_link()
            .withf(|email| email == "ada@example.edu")
            .returning(|_| Ok("https://id.example/reset/abc".to_owned()));
        let link = service(MockUserProfileRepository::new(), identity)
            .issue_password_reset(&admin_context("boss"), " ada@example.edu ")
            .await
            .expect("link");
        assert_eq!(link, "https://id.example/reset/abc");
    }

    #[tokio::test]
    async fn password_reset_for_unknown_account_is_not_found() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_password_reset_link()
            .returning(|email| Err(IdentityProviderError::unknown_account(email)));
        let err = service(MockUserProfileRepository::new(), identity)
            .issue_password_reset(&admin_context("boss"), "ghost@example.edu")
            .await
            .expect_err("unknown");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn details_fall_back_to_the_member_id() {
        let mut users = MockUserProfileRepository::new();
        users.expect_find().returning(|_| Ok(None));
        users
            .expect_find_by_member_id()
            .withf(|member_id| member_id.as_ref() == "CSE001")
            .returning(|_| Ok(Some(member_profile("uid-1"))));
        let mut purchases = MockPurchaseRepository::new();
        purchases
            .expect_list_for()
            .withf(|subject| subject.as_ref() == "uid-1")
            .returning(|_| Ok(Vec::new()));
        let service = AccountAdministration::new(
            Arc::new(users),
            Arc::new(MockContentRepository::new()),
            Arc::new(purchases),
            Arc::new(MockIdentityProvider::new()),
            fixture_clock(),
        );

        let details = service
            .member_details(&admin_context("boss"), "CSE001")
            .await
            .expect("found");
        assert_eq!(details.profile.subject, subject("uid-1"));
        assert!(details.purchases.is_empty());
    }

    #[tokio::test]
    async fn details_of_unknown_keys_are_not_found() {
        let mut users = MockUserProfileRepository::new();
        users.expect_find().returning(|_| Ok(None));
        users.expect_find_by_member_id().returning(|_| Ok(None));
        let err = service(users, MockIdentityProvider::new())
            .member_details(&admin_context("boss"), "ghost")
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn member_edits_trim_and_drop_blank_names() {
        let mut users = MockUserProfileRepository::new();
        users
            .expect_update_details()
            .withf(|_, edit| edit.display_name.is_none() && edit.mobile.as_deref() == Some("555"))
            .times(1)
            .returning(|raw, _| Ok(Some(member_profile(raw.as_ref()))));

        service(users, MockIdentityProvider::new())
            .update_member(
                &admin_context("boss"),
                &subject("uid-1"),
                MemberEdit {
                    display_name: Some("   ".to_owned()),
                    mobile: Some(" 555 ".to_owned()),
                    ..MemberEdit::default()
                },
            )
            .await
            .expect("updated");
    }

    #[tokio::test]
    async fn members_cannot_be_promoted_to_admin() {
        let mut users = MockUserProfileRepository::new();
        users.expect_update_details().never();
        let err = service(users, MockIdentityProvider::new())
            .update_member(
                &admin_context("boss"),
                &subject("uid-1"),
                MemberEdit {
                    role: Some(Role::Admin),
                    ..MemberEdit::default()
                },
            )
            .await
            .expect_err("refused");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn listing_members_requires_an_administrator() {
        let mut users = MockUserProfileRepository::new();
        users.expect_list().never();
        let err = service(users, MockIdentityProvider::new())
            .list_members(&member_context(member_profile("uid-2")), &MemberFilter::default())
            .await
            .expect_err("refused");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
