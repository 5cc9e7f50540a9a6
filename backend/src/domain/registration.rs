//! Member and administrator onboarding.
//!
//! Covers first registration, the post-login sync that creates or fills a
//! member record, profile completion, and proof-of-eligibility uploads.
//! A subject never ends up holding both profile classes.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ports::{
    AdminProfileRepository, BlobStore, MemberSequence, PlaceholderFill, ProfileCompletionRecord,
    ProfileRepositoryError, UserProfileRepository,
};
use super::{
    AdminProfile, BlobName, CheckedUpload, Department, Error, IdentityClaim, IdentityContext,
    MemberId, ProfileRecord, SubjectId, UNKNOWN_DISPLAY_NAME, UploadKind, UserProfile,
    check_upload, safe_segment, stored_name_for,
};

/// Details hint returned when a member record has not been created yet.
pub const PROFILE_NOT_SYNCHRONISED: &str = "profile_not_synchronised";

/// Fields supplied on member registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRegistration {
    pub display_name: String,
    pub email: String,
    pub mobile: String,
    pub department: String,
}

/// Fields supplied on administrator registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRegistration {
    pub display_name: String,
    pub email: String,
    /// Elevation credential presented by the client; stored for audit only.
    pub elevation_key: Option<String>,
}

/// Contact details supplied when completing a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileCompletion {
    pub mobile: String,
    pub department: String,
}

/// A proof document as received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofUpload {
    pub file_name: String,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

/// Where an accepted proof document was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofReceipt {
    pub name: BlobName,
    pub url: String,
}

/// A completed member profile and the locator of its proof document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedProfile {
    pub profile: UserProfile,
    pub proof: ProofReceipt,
}

/// Creates and maintains profile records.
#[derive(Clone)]
pub struct RegistrationService {
    users: Arc<dyn UserProfileRepository>,
    admins: Arc<dyn AdminProfileRepository>,
    sequence: Arc<dyn MemberSequence>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
}

impl RegistrationService {
    pub fn new(
        users: Arc<dyn UserProfileRepository>,
        admins: Arc<dyn AdminProfileRepository>,
        sequence: Arc<dyn MemberSequence>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            admins,
            sequence,
            blobs,
            clock,
        }
    }

    /// Register a new member and allocate their member identifier.
    ///
    /// # Errors
    /// `invalid_request` for blank fields or a malformed department,
    /// `conflict` when the subject already holds a profile or the email is
    /// taken.
    pub async fn register_user(
        &self,
        claim: &IdentityClaim,
        request: UserRegistration,
    ) -> Result<UserProfile, Error> {
        let display_name = required("name", &request.display_name)?;
        let email = required("email", &request.email)?;
        let mobile = required("mobile", &request.mobile)?;
        let department = Department::new(&request.department)?;
        self.ensure_unregistered(claim.subject()).await?;

        let member_id = self.allocate_member_id(&department).await?;
        let mut profile = UserProfile::new(claim.subject().clone(), self.clock.utc());
        profile.display_name = display_name;
        profile.email = Some(email);
        profile.mobile = Some(mobile);
        profile.department = Some(department);
        profile.member_id = Some(member_id);

        self.users.insert(&profile).await?;
        info!(subject = %profile.subject, member_id = ?profile.member_id, "member registered");
        Ok(profile)
    }

    /// Register a new administrator.
    ///
    /// # Errors
    /// `invalid_request` for blank fields, `conflict` when the subject
    /// already holds a profile or the email is taken.
    pub async fn register_admin(
        &self,
        claim: &IdentityClaim,
        request: AdminRegistration,
    ) -> Result<AdminProfile, Error> {
        let display_name = required("name", &request.display_name)?;
        let email = required("email", &request.email)?;
        self.ensure_unregistered(claim.subject()).await?;

        let profile = AdminProfile {
            subject: claim.subject().clone(),
            email,
            display_name,
            elevation_key_used: request
                .elevation_key
                .filter(|key| !key.trim().is_empty()),
            created_at: self.clock.utc(),
        };
        self.admins.insert(&profile).await?;
        info!(subject = %profile.subject, "administrator registered");
        Ok(profile)
    }

    /// Create the member record for a freshly signed-in subject, or fill
    /// gaps in an existing one.
    ///
    /// Only an empty email and an empty or placeholder display name are
    /// filled; nothing else is ever overwritten. Administrators are returned
    /// unchanged.
    ///
    /// # Errors
    /// Store failures, or `conflict` when the claim's email belongs to
    /// another member.
    pub async fn sync_profile(&self, claim: &IdentityClaim) -> Result<ProfileRecord, Error> {
        if let Some(profile) = self.users.find(claim.subject()).await? {
            return self.fill_from_claim(profile, claim).await.map(ProfileRecord::User);
        }
        if let Some(admin) = self.admins.find(claim.subject()).await? {
            return Ok(ProfileRecord::Admin(admin));
        }

        let profile = profile_from_claim(claim, self.clock.utc());
        match self.users.insert(&profile).await {
            Ok(()) => {
                info!(subject = %profile.subject, "member record created on sync");
                Ok(ProfileRecord::User(profile))
            }
            Err(ProfileRepositoryError::Duplicate { field }) if field == "subject" => {
                // A concurrent sync created the record first.
                let existing = self
                    .users
                    .find(claim.subject())
                    .await?
                    .ok_or_else(|| Error::internal("member record vanished during sync"))?;
                self.fill_from_claim(existing, claim)
                    .await
                    .map(ProfileRecord::User)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Record contact details and a proof document, then mark the profile
    /// complete.
    ///
    /// A shadow identity gets a member record on the way. A member identifier
    /// is allocated when the profile has none or moves department.
    ///
    /// # Errors
    /// `unauthorized` for anonymous callers, `conflict` for administrators,
    /// `invalid_request` for blank fields or a refused upload.
    pub async fn complete_profile(
        &self,
        ctx: &IdentityContext,
        completion: ProfileCompletion,
        upload: ProofUpload,
    ) -> Result<CompletedProfile, Error> {
        let Some(claim) = ctx.claim() else {
            return Err(Error::unauthorized("authentication required"));
        };
        if ctx.is_admin() {
            return Err(Error::conflict("administrators do not hold member profiles"));
        }
        let mobile = required("mobile", &completion.mobile)?;
        let department = Department::new(&completion.department)?;
        let checked = check_upload(
            UploadKind::IdProof,
            &upload.file_name,
            upload.content,
            upload.content_type.as_deref(),
        )?;

        let current = match ctx.user_profile() {
            Some(profile) => profile.clone(),
            None => {
                let created = profile_from_claim(claim, self.clock.utc());
                self.users.insert(&created).await?;
                created
            }
        };

        let member_id = match current.member_id {
            Some(id) if current.department.as_ref() == Some(&department) => id,
            _ => self.allocate_member_id(&department).await?,
        };
        let stored = self.store_proof(&current.subject, checked).await?;
        let record = ProfileCompletionRecord {
            mobile,
            department,
            member_id,
            proof_file: stored.clone(),
            uploaded_at: self.clock.utc(),
        };
        let written = self.users.complete(&current.subject, &record).await;
        let profile = self.keep_proof_if_written(written, &stored).await?;
        self.discard_previous(current.proof.file, &stored).await?;
        info!(subject = %profile.subject, member_id = ?profile.member_id, "profile completed");

        let proof = ProofReceipt {
            url: self.blobs.url_for(&stored),
            name: stored,
        };
        Ok(CompletedProfile { profile, proof })
    }

    /// Replace the caller's proof-of-eligibility document.
    ///
    /// The new document is stored as `id-proofs/<subject>_<uuid>.<ext>` and
    /// any earlier one is removed. Review state resets to unverified.
    ///
    /// # Errors
    /// `unauthorized` for anonymous callers, `not_found` with a
    /// `profile_not_synchronised` hint when no member record exists,
    /// `invalid_request` for refused uploads.
    pub async fn upload_proof(
        &self,
        ctx: &IdentityContext,
        upload: ProofUpload,
    ) -> Result<ProofReceipt, Error> {
        if !ctx.is_authenticated() {
            return Err(Error::unauthorized("authentication required"));
        }
        let Some(current) = ctx.user_profile() else {
            return Err(profile_not_synchronised());
        };
        let checked = check_upload(
            UploadKind::IdProof,
            &upload.file_name,
            upload.content,
            upload.content_type.as_deref(),
        )?;

        let stored = self.store_proof(&current.subject, checked).await?;
        let written = self
            .users
            .set_proof_file(&current.subject, &stored, self.clock.utc())
            .await;
        let profile = self.keep_proof_if_written(written, &stored).await?;
        self.discard_previous(current.proof.file.clone(), &stored)
            .await?;
        info!(subject = %profile.subject, name = %stored, "proof document stored");

        Ok(ProofReceipt {
            url: self.blobs.url_for(&stored),
            name: stored,
        })
    }

    /// Save a proof document as `id-proofs/<subject>_<uuid>.<ext>`.
    async fn store_proof(
        &self,
        subject: &SubjectId,
        checked: CheckedUpload,
    ) -> Result<BlobName, Error> {
        let stem = format!("{}_{}", safe_segment(subject.as_ref()), Uuid::new_v4().simple());
        let name = stored_name_for(&checked, &stem)?;
        Ok(self
            .blobs
            .save(&name, checked.content, checked.content_type)
            .await?)
    }

    /// Unwrap the profile written alongside `stored`, deleting the blob when
    /// the write failed or found no record.
    async fn keep_proof_if_written(
        &self,
        written: Result<Option<UserProfile>, ProfileRepositoryError>,
        stored: &BlobName,
    ) -> Result<UserProfile, Error> {
        match written {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => {
                self.blobs.delete(stored).await?;
                Err(profile_not_synchronised())
            }
            Err(err) => {
                if let Err(cleanup) = self.blobs.delete(stored).await {
                    warn!(name = %stored, error = %cleanup, "failed to remove orphaned proof");
                }
                Err(err.into())
            }
        }
    }

    async fn ensure_unregistered(&self, subject: &SubjectId) -> Result<(), Error> {
        let registered = self.users.find(subject).await?.is_some()
            || self.admins.find(subject).await?.is_some();
        if registered {
            return Err(Error::conflict("subject is already registered")
                .with_reason("already_registered"));
        }
        Ok(())
    }

    async fn allocate_member_id(&self, department: &Department) -> Result<MemberId, Error> {
        let sequence = self.sequence.next(department).await?;
        Ok(MemberId::allocate(department, sequence))
    }

    async fn fill_from_claim(
        &self,
        profile: UserProfile,
        claim: &IdentityClaim,
    ) -> Result<UserProfile, Error> {
        let email_missing = profile
            .email
            .as_deref()
            .is_none_or(|email| email.trim().is_empty());
        let fill = PlaceholderFill {
            email: claim.email().filter(|_| email_missing).map(str::to_owned),
            display_name: claim
                .display_name()
                .filter(|_| profile.has_placeholder_name())
                .map(str::to_owned),
        };
        if fill == PlaceholderFill::default() {
            return Ok(profile);
        }

        let filled = self
            .users
            .fill_placeholders(&profile.subject, &fill)
            .await?
            .ok_or_else(|| Error::internal("member record vanished during sync"))?;
        debug!(subject = %filled.subject, "filled member record from identity claim");
        Ok(filled)
    }

    async fn discard_previous(
        &self,
        previous: Option<BlobName>,
        stored: &BlobName,
    ) -> Result<(), Error> {
        if let Some(old) = previous.filter(|old| old != stored) {
            self.blobs.delete(&old).await?;
        }
        Ok(())
    }
}

fn profile_from_claim(claim: &IdentityClaim, now: chrono::DateTime<chrono::Utc>) -> UserProfile {
    let mut profile = UserProfile::new(claim.subject().clone(), now);
    profile.email = claim.email().map(str::to_owned);
    profile.display_name = claim
        .display_name()
        .unwrap_or(UNKNOWN_DISPLAY_NAME)
        .to_owned();
    profile
}

fn required(field: &'static str, value: &str) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_request(format!("{field} is required"))
            .with_reason("missing_field")
            .with_detail("field", field));
    }
    Ok(trimmed.to_owned())
}

/// `not_found` carrying the `profile_not_synchronised` hint.
#[must_use]
pub fn profile_not_synchronised() -> Error {
    Error::not_found("profile not yet synchronised")
        .with_reason(PROFILE_NOT_SYNCHRONISED)
}
