//! In-memory profile records of both classes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    AdminProfileRepository, PlaceholderFill, ProfileCompletionRecord, ProfileRepositoryError,
    UserProfileRepository,
};
use crate::domain::{
    AdminProfile, BlobName, MemberEdit, MemberFilter, MemberId, ProofDocument, ProofStatus,
    SubjectId, UserProfile,
};

#[derive(Debug, Default)]
struct Profiles {
    users: HashMap<SubjectId, UserProfile>,
    admins: HashMap<SubjectId, AdminProfile>,
}

/// Holds member and administrator records in one table per class.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    inner: Mutex<Profiles>,
}

impl InMemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Profiles>, ProfileRepositoryError> {
        self.inner
            .lock()
            .map_err(|_| ProfileRepositoryError::query("profile store lock poisoned"))
    }

    /// Apply `change` to a copy of the record and store it when the result
    /// clashes with no other member.
    fn modify_user(
        &self,
        subject: &SubjectId,
        change: impl FnOnce(&mut UserProfile),
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        let mut guard = self.lock()?;
        let Some(mut profile) = guard.users.get(subject).cloned() else {
            return Ok(None);
        };
        change(&mut profile);
        if let Some(field) = user_clash(&guard, &profile) {
            return Err(ProfileRepositoryError::duplicate(field));
        }
        guard.users.insert(subject.clone(), profile.clone());
        Ok(Some(profile))
    }
}

fn same_email(left: Option<&str>, right: Option<&str>) -> bool {
    match (left, right) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// Field of `candidate` that clashes with another member's record.
fn user_clash(profiles: &Profiles, candidate: &UserProfile) -> Option<&'static str> {
    profiles
        .users
        .values()
        .filter(|other| other.subject != candidate.subject)
        .find_map(|other| {
            if same_email(other.email.as_deref(), candidate.email.as_deref()) {
                Some("email")
            } else if other.member_id.is_some() && other.member_id == candidate.member_id {
                Some("member_id")
            } else {
                None
            }
        })
}

#[async_trait]
impl UserProfileRepository for InMemoryProfileStore {
    async fn find(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        Ok(self.lock()?.users.get(subject).cloned())
    }

    async fn find_by_member_id(
        &self,
        member_id: &MemberId,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|profile| profile.member_id.as_ref() == Some(member_id))
            .cloned())
    }

    async fn list(
        &self,
        filter: &MemberFilter,
    ) -> Result<Vec<UserProfile>, ProfileRepositoryError> {
        let mut members: Vec<UserProfile> = self
            .lock()?
            .users
            .values()
            .filter(|profile| filter.matches(profile))
            .cloned()
            .collect();
        members.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(members)
    }

    async fn insert(&self, profile: &UserProfile) -> Result<(), ProfileRepositoryError> {
        let mut guard = self.lock()?;
        if guard.users.contains_key(&profile.subject) {
            return Err(ProfileRepositoryError::duplicate("subject"));
        }
        if let Some(field) = user_clash(&guard, profile) {
            return Err(ProfileRepositoryError::duplicate(field));
        }
        guard.users.insert(profile.subject.clone(), profile.clone());
        Ok(())
    }

    async fn fill_placeholders(
        &self,
        subject: &SubjectId,
        fill: &PlaceholderFill,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        self.modify_user(subject, |profile| {
            let email_missing = profile
                .email
                .as_deref()
                .is_none_or(|email| email.trim().is_empty());
            if let (true, Some(email)) = (email_missing, fill.email.as_ref()) {
                profile.email = Some(email.clone());
            }
            if let (true, Some(name)) = (profile.has_placeholder_name(), fill.display_name.as_ref())
            {
                profile.display_name.clone_from(name);
            }
        })
    }

    async fn update_details(
        &self,
        subject: &SubjectId,
        edit: &MemberEdit,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        self.modify_user(subject, |profile| edit.apply(profile))
    }

    async fn set_proof_file(
        &self,
        subject: &SubjectId,
        file: &BlobName,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        self.modify_user(subject, |profile| {
            profile.proof = ProofDocument {
                file: Some(file.clone()),
                status: ProofStatus::Unverified,
                uploaded_at: Some(uploaded_at),
            };
        })
    }

    async fn complete(
        &self,
        subject: &SubjectId,
        record: &ProfileCompletionRecord,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        self.modify_user(subject, |profile| {
            profile.mobile = Some(record.mobile.clone());
            profile.department = Some(record.department.clone());
            profile.member_id = Some(record.member_id.clone());
            profile.profile_completed = true;
            profile.proof = ProofDocument {
                file: Some(record.proof_file.clone()),
                status: ProofStatus::Unverified,
                uploaded_at: Some(record.uploaded_at),
            };
        })
    }

    async fn set_suspension(
        &self,
        subject: &SubjectId,
        suspended_at: Option<DateTime<Utc>>,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        self.modify_user(subject, |profile| profile.suspended_at = suspended_at)
    }

    async fn set_proof_status(
        &self,
        subject: &SubjectId,
        status: &ProofStatus,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        self.modify_user(subject, |profile| profile.proof.status = status.clone())
    }
}

#[async_trait]
impl AdminProfileRepository for InMemoryProfileStore {
    async fn find(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<AdminProfile>, ProfileRepositoryError> {
        Ok(self.lock()?.admins.get(subject).cloned())
    }

    async fn insert(&self, profile: &AdminProfile) -> Result<(), ProfileRepositoryError> {
        let mut guard = self.lock()?;
        if guard.admins.contains_key(&profile.subject) {
            return Err(ProfileRepositoryError::duplicate("subject"));
        }
        if guard
            .admins
            .values()
            .any(|other| other.email.eq_ignore_ascii_case(&profile.email))
        {
            return Err(ProfileRepositoryError::duplicate("email"));
        }
        guard.admins.insert(profile.subject.clone(), profile.clone());
        Ok(())
    }
}
