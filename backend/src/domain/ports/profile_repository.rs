//! Ports for user and administrator profile persistence.
//!
//! Both profile classes share one subject-identifier space and one error
//! type. Adapters enforce uniqueness of the subject and of the email within a
//! class and report collisions as [`ProfileRepositoryError::Duplicate`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AdminProfile, BlobName, Department, MemberEdit, MemberFilter, MemberId, ProofStatus,
    SubjectId, UserProfile,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by profile repository adapters.
    pub enum ProfileRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "profile repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "profile repository query failed: {message}",
        /// A unique field already belongs to another profile.
        Duplicate { field: String } => "a profile with this {field} already exists",
    }
}

/// Claim values offered to fill gaps in a member record.
///
/// Adapters write `email` only over a missing or blank address and
/// `display_name` only over an empty or placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderFill {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Columns written when a member completes their profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileCompletionRecord {
    pub mobile: String,
    pub department: Department,
    pub member_id: MemberId,
    pub proof_file: BlobName,
    pub uploaded_at: DateTime<Utc>,
}

/// Member record mutations.
///
/// Every mutation is a single-row statement touching only its own columns,
/// so concurrent writers never revert one another. In particular nothing
/// but [`UserProfileRepository::set_suspension`] writes the suspension
/// timestamp, and nothing but [`UserProfileRepository::set_proof_status`]
/// records a review verdict.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    /// Fetch the user profile for `subject`.
    async fn find(&self, subject: &SubjectId)
    -> Result<Option<UserProfile>, ProfileRepositoryError>;

    /// Fetch the profile holding `member_id`.
    async fn find_by_member_id(
        &self,
        member_id: &MemberId,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError>;

    /// Members matching `filter`, newest first.
    async fn list(&self, filter: &MemberFilter)
    -> Result<Vec<UserProfile>, ProfileRepositoryError>;

    /// Insert a new profile.
    async fn insert(&self, profile: &UserProfile) -> Result<(), ProfileRepositoryError>;

    /// Write the fields set in `edit` and nothing else.
    ///
    /// Returns the updated profile, or `None` when none exists.
    async fn update_details(
        &self,
        subject: &SubjectId,
        edit: &MemberEdit,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError>;

    /// Fill a blank email and a placeholder display name from `fill`.
    ///
    /// Returns the stored profile, or `None` when none exists.
    async fn fill_placeholders(
        &self,
        subject: &SubjectId,
        fill: &PlaceholderFill,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError>;

    /// Point the profile at a new proof document and reset its review to
    /// unverified.
    ///
    /// Returns the updated profile, or `None` when none exists.
    async fn set_proof_file(
        &self,
        subject: &SubjectId,
        file: &BlobName,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError>;

    /// Record contact details and a fresh proof document, and mark the
    /// profile complete.
    ///
    /// Returns the updated profile, or `None` when none exists.
    async fn complete(
        &self,
        subject: &SubjectId,
        record: &ProfileCompletionRecord,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError>;

    /// Set or clear the suspension timestamp in one statement.
    ///
    /// Returns the updated profile, or `None` when none exists.
    async fn set_suspension(
        &self,
        subject: &SubjectId,
        suspended_at: Option<DateTime<Utc>>,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError>;

    /// Record a proof review outcome in one statement.
    ///
    /// Returns the updated profile, or `None` when none exists.
    async fn set_proof_status(
        &self,
        subject: &SubjectId,
        status: &ProofStatus,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminProfileRepository: Send + Sync {
    /// Fetch the administrator profile for `subject`.
    async fn find(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<AdminProfile>, ProfileRepositoryError>;

    /// Insert a new administrator profile.
    async fn insert(&self, profile: &AdminProfile) -> Result<(), ProfileRepositoryError>;
}
