//! PostgreSQL-backed profile repositories using Diesel ORM.
//!
//! One adapter serves both profile classes. Uniqueness of subject, email and
//! member identifier is enforced by the schema; violations come back as
//! [`ProfileRepositoryError::Duplicate`] naming the offending field.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    AdminProfileRepository, PlaceholderFill, ProfileCompletionRecord, ProfileRepositoryError,
    UserProfileRepository,
};
use crate::domain::{
    AdminProfile, BlobName, Department, MemberEdit, MemberFilter, MemberId, ProofDocument,
    ProofFilter, ProofStatus, Role, SubjectId, UNKNOWN_DISPLAY_NAME, UserProfile,
};

use super::diesel_basic_error_mapping::{map_basic_pool_error, map_unique_diesel_error};
use super::models::{
    AdminProfileRow, MemberDetailsUpdate, NewAdminProfileRow, NewUserProfileRow,
    ProfileCompletionUpdate, ProofFileUpdate, ProofReviewUpdate, UserProfileRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{admin_profiles, user_profiles};
use super::search_pattern::contains_pattern;

/// Diesel-backed implementation of both profile repository ports.
#[derive(Clone)]
pub struct DieselProfileRepository {
    pool: DbPool,
}

impl DieselProfileRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProfileRepositoryError {
    map_basic_pool_error(error, ProfileRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ProfileRepositoryError {
    map_unique_diesel_error(
        error,
        |constraint| ProfileRepositoryError::duplicate(duplicate_field(constraint)),
        ProfileRepositoryError::query,
        ProfileRepositoryError::connection,
    )
}

/// Name the profile field a unique constraint protects.
fn duplicate_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(name) if name.contains("email") => "email",
        Some(name) if name.contains("member_id") => "member_id",
        _ => "subject",
    }
}

/// Database encoding of a proof status: label, review time, rejection reason.
fn proof_columns(status: &ProofStatus) -> (&'static str, Option<DateTime<Utc>>, Option<&str>) {
    match status {
        ProofStatus::Unverified => ("unverified", None, None),
        ProofStatus::Verified { verified_at } => ("verified", Some(*verified_at), None),
        ProofStatus::Rejected {
            reason,
            rejected_at,
        } => ("rejected", Some(*rejected_at), Some(reason.as_str())),
    }
}

fn proof_status_from_row(row: &UserProfileRow) -> Result<ProofStatus, String> {
    match (row.proof_status.as_str(), row.proof_reviewed_at) {
        ("unverified", _) => Ok(ProofStatus::Unverified),
        ("verified", Some(verified_at)) => Ok(ProofStatus::Verified { verified_at }),
        ("rejected", Some(rejected_at)) => Ok(ProofStatus::Rejected {
            reason: row.proof_rejection_reason.clone().unwrap_or_default(),
            rejected_at,
        }),
        (other, _) => Err(format!("invalid proof status in database: {other}")),
    }
}

/// Convert a database row to a domain user profile.
fn row_to_user(row: UserProfileRow) -> Result<UserProfile, String> {
    let proof_status = proof_status_from_row(&row)?;
    let subject = SubjectId::new(row.subject).map_err(|err| format!("invalid subject: {err}"))?;
    let role = row
        .role
        .parse::<Role>()
        .map_err(|err| format!("invalid role in database: {err}"))?;
    let department = row
        .department
        .map(Department::new)
        .transpose()
        .map_err(|err| format!("invalid department in database: {err}"))?;
    let member_id = row
        .member_id
        .map(MemberId::new)
        .transpose()
        .map_err(|err| format!("invalid member id in database: {err}"))?;
    let proof_file = row
        .proof_file
        .map(BlobName::new)
        .transpose()
        .map_err(|err| format!("invalid proof file in database: {err}"))?;

    Ok(UserProfile {
        subject,
        email: row.email,
        display_name: row.display_name,
        role,
        department,
        semester: row.semester,
        member_id,
        mobile: row.mobile,
        proof: ProofDocument {
            file: proof_file,
            status: proof_status,
            uploaded_at: row.proof_uploaded_at,
        },
        suspended_at: row.suspended_at,
        profile_completed: row.profile_completed,
        created_at: row.created_at,
    })
}

fn row_to_admin(row: AdminProfileRow) -> Result<AdminProfile, String> {
    Ok(AdminProfile {
        subject: SubjectId::new(row.subject).map_err(|err| format!("invalid subject: {err}"))?,
        email: row.email,
        display_name: row.display_name,
        elevation_key_used: row.elevation_key_used,
        created_at: row.created_at,
    })
}

fn corrupt_row(message: String) -> ProfileRepositoryError {
    ProfileRepositoryError::query(message)
}

fn new_user_row(profile: &UserProfile) -> NewUserProfileRow<'_> {
    let (proof_status, proof_reviewed_at, proof_rejection_reason) =
        proof_columns(&profile.proof.status);
    NewUserProfileRow {
        subject: profile.subject.as_ref(),
        email: profile.email.as_deref(),
        display_name: &profile.display_name,
        role: profile.role.as_str(),
        department: profile.department.as_ref().map(AsRef::as_ref),
        semester: profile.semester.as_deref(),
        member_id: profile.member_id.as_ref().map(AsRef::as_ref),
        mobile: profile.mobile.as_deref(),
        proof_file: profile.proof.file.as_ref().map(AsRef::as_ref),
        proof_status,
        proof_reviewed_at,
        proof_rejection_reason,
        proof_uploaded_at: profile.proof.uploaded_at,
        suspended_at: profile.suspended_at,
        profile_completed: profile.profile_completed,
        created_at: profile.created_at,
    }
}

fn proof_file_update(file: &BlobName, uploaded_at: DateTime<Utc>) -> ProofFileUpdate<'_> {
    let (proof_status, proof_reviewed_at, proof_rejection_reason) =
        proof_columns(&ProofStatus::Unverified);
    ProofFileUpdate {
        proof_file: file.as_ref(),
        proof_status,
        proof_reviewed_at,
        proof_rejection_reason,
        proof_uploaded_at: uploaded_at,
    }
}

fn completion_update(record: &ProfileCompletionRecord) -> ProfileCompletionUpdate<'_> {
    let proof = proof_file_update(&record.proof_file, record.uploaded_at);
    ProfileCompletionUpdate {
        mobile: &record.mobile,
        department: record.department.as_ref(),
        member_id: record.member_id.as_ref(),
        profile_completed: true,
        proof_file: proof.proof_file,
        proof_status: proof.proof_status,
        proof_reviewed_at: proof.proof_reviewed_at,
        proof_rejection_reason: proof.proof_rejection_reason,
        proof_uploaded_at: proof.proof_uploaded_at,
    }
}

/// Status label an uploaded proof must carry to pass `filter`; `None` asks
/// for members without a proof file.
fn stored_proof_label(filter: ProofFilter) -> Option<&'static str> {
    match filter {
        ProofFilter::NotUploaded => None,
        ProofFilter::Pending => Some("unverified"),
        ProofFilter::Verified => Some("verified"),
        ProofFilter::Rejected => Some("rejected"),
    }
}

fn details_update(edit: &MemberEdit) -> MemberDetailsUpdate<'_> {
    MemberDetailsUpdate {
        display_name: edit.display_name.as_deref(),
        mobile: edit.mobile.as_deref(),
        department: edit.department.as_ref().map(AsRef::as_ref),
        semester: edit.semester.as_deref(),
        role: edit.role.map(Role::as_str),
    }
}

#[async_trait]
impl UserProfileRepository for DieselProfileRepository {
    async fn find(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserProfileRow> = user_profiles::table
            .filter(user_profiles::subject.eq(subject.as_ref()))
            .select(UserProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose().map_err(corrupt_row)
    }

    async fn find_by_member_id(
        &self,
        member_id: &MemberId,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserProfileRow> = user_profiles::table
            .filter(user_profiles::member_id.eq(member_id.as_ref()))
            .select(UserProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose().map_err(corrupt_row)
    }

    async fn list(
        &self,
        filter: &MemberFilter,
    ) -> Result<Vec<UserProfile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = user_profiles::table.into_boxed();
        if let Some(role) = filter.role {
            query = query.filter(user_profiles::role.eq(role.as_str()));
        }
        if let Some(department) = filter.department.as_ref() {
            query = query.filter(user_profiles::department.eq(department.as_ref()));
        }
        if let Some(semester) = filter.semester.as_deref() {
            query = query.filter(user_profiles::semester.eq(semester));
        }
        if let Some(proof) = filter.proof {
            query = match stored_proof_label(proof) {
                None => query.filter(user_profiles::proof_file.is_null()),
                Some(label) => query
                    .filter(user_profiles::proof_file.is_not_null())
                    .filter(user_profiles::proof_status.eq(label)),
            };
        }
        if let Some(search) = filter.search.as_deref() {
            let pattern = contains_pattern(search);
            query = query.filter(
                user_profiles::display_name
                    .ilike(pattern.clone())
                    .or(user_profiles::email.ilike(pattern.clone()))
                    .or(user_profiles::member_id.ilike(pattern)),
            );
        }

        let rows: Vec<UserProfileRow> = query
            .order((user_profiles::created_at.desc(), user_profiles::subject.asc()))
            .select(UserProfileRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(row_to_user)
            .collect::<Result<_, _>>()
            .map_err(corrupt_row)
    }

    async fn insert(&self, profile: &UserProfile) -> Result<(), ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(user_profiles::table)
            .values(&new_user_row(profile))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn fill_placeholders(
        &self,
        subject: &SubjectId,
        fill: &PlaceholderFill,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // Each gap is filled by its own guarded statement so populated
        // columns are never rewritten.
        if let Some(email) = fill.email.as_deref() {
            diesel::update(user_profiles::table)
                .filter(user_profiles::subject.eq(subject.as_ref()))
                .filter(
                    user_profiles::email
                        .is_null()
                        .or(user_profiles::email.eq("")),
                )
                .set(user_profiles::email.eq(email))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        }
        if let Some(name) = fill.display_name.as_deref() {
            diesel::update(user_profiles::table)
                .filter(user_profiles::subject.eq(subject.as_ref()))
                .filter(user_profiles::display_name.eq_any(vec![UNKNOWN_DISPLAY_NAME, ""]))
                .set(user_profiles::display_name.eq(name))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        }

        let row: Option<UserProfileRow> = user_profiles::table
            .filter(user_profiles::subject.eq(subject.as_ref()))
            .select(UserProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose().map_err(corrupt_row)
    }

    async fn update_details(
        &self,
        subject: &SubjectId,
        edit: &MemberEdit,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        // An empty changeset is not a valid UPDATE.
        if edit.is_empty() {
            return UserProfileRepository::find(self, subject).await;
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserProfileRow> = diesel::update(user_profiles::table)
            .filter(user_profiles::subject.eq(subject.as_ref()))
            .set(&details_update(edit))
            .returning(UserProfileRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose().map_err(corrupt_row)
    }

    async fn set_proof_file(
        &self,
        subject: &SubjectId,
        file: &BlobName,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserProfileRow> = diesel::update(user_profiles::table)
            .filter(user_profiles::subject.eq(subject.as_ref()))
            .set(&proof_file_update(file, uploaded_at))
            .returning(UserProfileRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose().map_err(corrupt_row)
    }

    async fn complete(
        &self,
        subject: &SubjectId,
        record: &ProfileCompletionRecord,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserProfileRow> = diesel::update(user_profiles::table)
            .filter(user_profiles::subject.eq(subject.as_ref()))
            .set(&completion_update(record))
            .returning(UserProfileRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose().map_err(corrupt_row)
    }

    async fn set_suspension(
        &self,
        subject: &SubjectId,
        suspended_at: Option<DateTime<Utc>>,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserProfileRow> = diesel::update(user_profiles::table)
            .filter(user_profiles::subject.eq(subject.as_ref()))
            .set(user_profiles::suspended_at.eq(suspended_at))
            .returning(UserProfileRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose().map_err(corrupt_row)
    }

    async fn set_proof_status(
        &self,
        subject: &SubjectId,
        status: &ProofStatus,
    ) -> Result<Option<UserProfile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (proof_status, proof_reviewed_at, proof_rejection_reason) = proof_columns(status);

        let row: Option<UserProfileRow> = diesel::update(user_profiles::table)
            .filter(user_profiles::subject.eq(subject.as_ref()))
            .set(&ProofReviewUpdate {
                proof_status,
                proof_reviewed_at,
                proof_rejection_reason,
            })
            .returning(UserProfileRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose().map_err(corrupt_row)
    }
}

#[async_trait]
impl AdminProfileRepository for DieselProfileRepository {
    async fn find(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<AdminProfile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<AdminProfileRow> = admin_profiles::table
            .filter(admin_profiles::subject.eq(subject.as_ref()))
            .select(AdminProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_admin).transpose().map_err(corrupt_row)
    }

    async fn insert(&self, profile: &AdminProfile) -> Result<(), ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewAdminProfileRow {
            subject: profile.subject.as_ref(),
            email: &profile.email,
            display_name: &profile.display_name,
            elevation_key_used: profile.elevation_key_used.as_deref(),
            created_at: profile.created_at,
        };

        diesel::insert_into(admin_profiles::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
