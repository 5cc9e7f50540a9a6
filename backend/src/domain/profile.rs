//! Locally owned profile records.
//!
//! A subject identifier resolves to at most one of two disjoint profile
//! classes: [`UserProfile`] for library members and [`AdminProfile`] for
//! administrators. Roles always come from these records, never from the
//! identity claim.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BlobName, SubjectId};

/// Display name assigned when the identity service supplies none.
pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown";

/// Maximum length of a department code.
pub const DEPARTMENT_MAX: usize = 16;

/// Role attached to an identity context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Default member role.
    #[default]
    Student,
    Faculty,
    Alumni,
    /// Fixed role of every administrator profile.
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Alumni => "alumni",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "faculty" => Ok(Self::Faculty),
            "alumni" => Ok(Self::Alumni),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

/// Validation errors for profile attributes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileValidationError {
    #[error("department must not be empty")]
    EmptyDepartment,
    #[error("department must be at most {max} characters")]
    DepartmentTooLong { max: usize },
    #[error("department may only contain ASCII letters")]
    InvalidDepartmentCharacters,
    #[error("member identifier must not be empty")]
    EmptyMemberId,
}

/// Department code used as the member-identifier prefix.
///
/// Stored upper-cased so `cse` and `CSE` share one sequence. Letters only:
/// a digit in the code would let `A` + `1001` and `A1` + `1` format to the
/// same member identifier.
///
/// # Examples
/// ```
/// use library_backend::domain::Department;
///
/// let dept = Department::new(" cse ").expect("valid department");
/// assert_eq!(dept.as_ref(), "CSE");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Department(String);

impl Department {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ProfileValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ProfileValidationError::EmptyDepartment);
        }
        if trimmed.chars().count() > DEPARTMENT_MAX {
            return Err(ProfileValidationError::DepartmentTooLong {
                max: DEPARTMENT_MAX,
            });
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ProfileValidationError::InvalidDepartmentCharacters);
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }
}

impl AsRef<str> for Department {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Department> for String {
    fn from(value: Department) -> Self {
        value.0
    }
}

impl TryFrom<String> for Department {
    type Error = ProfileValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Department-prefixed member identifier such as `CSE001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberId(String);

impl MemberId {
    /// Format the identifier for the `sequence`-th member of `department`.
    ///
    /// Sequences are zero-padded to three digits and widen beyond 999.
    ///
    /// # Examples
    /// ```
    /// use library_backend::domain::{Department, MemberId};
    ///
    /// let dept = Department::new("CSE").unwrap();
    /// assert_eq!(MemberId::allocate(&dept, 1).as_ref(), "CSE001");
    /// assert_eq!(MemberId::allocate(&dept, 1234).as_ref(), "CSE1234");
    /// ```
    #[must_use]
    pub fn allocate(department: &Department, sequence: u32) -> Self {
        Self(format!("{department}{sequence:03}"))
    }

    /// Rehydrate a stored identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, ProfileValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ProfileValidationError::EmptyMemberId);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for MemberId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<MemberId> for String {
    fn from(value: MemberId) -> Self {
        value.0
    }
}

impl TryFrom<String> for MemberId {
    type Error = ProfileValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Review state of a member's proof-of-eligibility document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProofStatus {
    #[default]
    Unverified,
    Verified {
        verified_at: DateTime<Utc>,
    },
    Rejected {
        reason: String,
        rejected_at: DateTime<Utc>,
    },
}

/// Proof-of-eligibility document attached to a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProofDocument {
    /// Blob holding the uploaded document, if any.
    pub file: Option<BlobName>,
    pub status: ProofStatus,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Persistent record for a library member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub subject: SubjectId,
    pub email: Option<String>,
    pub display_name: String,
    pub role: Role,
    pub department: Option<Department>,
    pub semester: Option<String>,
    pub member_id: Option<MemberId>,
    pub mobile: Option<String>,
    pub proof: ProofDocument,
    /// Set while the account is suspended.
    pub suspended_at: Option<DateTime<Utc>>,
    pub profile_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Fresh, incomplete student profile.
    #[must_use]
    pub fn new(subject: SubjectId, created_at: DateTime<Utc>) -> Self {
        Self {
            subject,
            email: None,
            display_name: UNKNOWN_DISPLAY_NAME.to_owned(),
            role: Role::Student,
            department: None,
            semester: None,
            member_id: None,
            mobile: None,
            proof: ProofDocument::default(),
            suspended_at: None,
            profile_completed: false,
            created_at,
        }
    }

    #[must_use]
    pub const fn is_suspended(&self) -> bool {
        self.suspended_at.is_some()
    }

    /// Whether the display name still needs a real value.
    #[must_use]
    pub fn has_placeholder_name(&self) -> bool {
        let name = self.display_name.trim();
        name.is_empty() || name == UNKNOWN_DISPLAY_NAME
    }
}

/// Proof document state used to filter member listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofFilter {
    Verified,
    /// Uploaded and awaiting review.
    Pending,
    Rejected,
    NotUploaded,
}

/// Error returned when parsing an unknown proof filter label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown proof status: {0}")]
pub struct UnknownProofFilter(pub String);

impl FromStr for ProofFilter {
    type Err = UnknownProofFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verified" => Ok(Self::Verified),
            "pending" => Ok(Self::Pending),
            "rejected" => Ok(Self::Rejected),
            "not_uploaded" => Ok(Self::NotUploaded),
            other => Err(UnknownProofFilter(other.to_owned())),
        }
    }
}

impl ProofFilter {
    #[must_use]
    pub fn matches(self, proof: &ProofDocument) -> bool {
        match (self, &proof.status) {
            (Self::NotUploaded, _) => proof.file.is_none(),
            (_, _) if proof.file.is_none() => false,
            (Self::Verified, ProofStatus::Verified { .. })
            | (Self::Pending, ProofStatus::Unverified)
            | (Self::Rejected, ProofStatus::Rejected { .. }) => true,
            _ => false,
        }
    }
}

/// Administrator listing filter. Unset fields match every member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFilter {
    pub role: Option<Role>,
    pub department: Option<Department>,
    pub semester: Option<String>,
    /// Case-insensitive substring of the name, email or member identifier.
    pub search: Option<String>,
    pub proof: Option<ProofFilter>,
}

impl MemberFilter {
    /// Whether `profile` passes every set criterion.
    #[must_use]
    pub fn matches(&self, profile: &UserProfile) -> bool {
        let contains = |value: Option<&str>, needle: &str| {
            value.is_some_and(|value| value.to_lowercase().contains(needle))
        };
        self.role.is_none_or(|role| profile.role == role)
            && self
                .department
                .as_ref()
                .is_none_or(|department| profile.department.as_ref() == Some(department))
            && self
                .semester
                .as_ref()
                .is_none_or(|semester| profile.semester.as_ref() == Some(semester))
            && self.proof.is_none_or(|proof| proof.matches(&profile.proof))
            && self.search.as_deref().is_none_or(|needle| {
                let needle = needle.to_lowercase();
                contains(Some(&profile.display_name), &needle)
                    || contains(profile.email.as_deref(), &needle)
                    || contains(profile.member_id.as_ref().map(AsRef::as_ref), &needle)
            })
    }
}

/// Administrator edit of a member's descriptive fields.
///
/// Only these columns change; suspension and proof review are untouched.
/// A department change keeps the existing member identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberEdit {
    pub display_name: Option<String>,
    pub mobile: Option<String>,
    pub department: Option<Department>,
    pub semester: Option<String>,
    pub role: Option<Role>,
}

impl MemberEdit {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the edit to an in-memory record.
    pub fn apply(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.display_name {
            profile.display_name.clone_from(name);
        }
        if let Some(mobile) = &self.mobile {
            profile.mobile = Some(mobile.clone());
        }
        if let Some(department) = &self.department {
            profile.department = Some(department.clone());
        }
        if let Some(semester) = &self.semester {
            profile.semester = Some(semester.clone());
        }
        if let Some(role) = self.role {
            profile.role = role;
        }
    }
}

/// Persistent record for an administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminProfile {
    pub subject: SubjectId,
    pub email: String,
    pub display_name: String,
    /// Elevation credential presented at registration, kept for audit.
    pub elevation_key_used: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A resolved profile of either class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileRecord {
    User(UserProfile),
    Admin(AdminProfile),
}

impl From<ProfileValidationError> for super::Error {
    fn from(err: ProfileValidationError) -> Self {
        Self::invalid_request(err.to_string())
    }
}
