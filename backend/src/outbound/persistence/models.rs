//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions to domain types live beside
//! the repositories that use them.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{admin_profiles, blobs, content_items, purchases, user_profiles};

// ---------------------------------------------------------------------------
// Profile models
// ---------------------------------------------------------------------------

/// Row struct for reading from the user_profiles table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserProfileRow {
    pub subject: String,
    pub email: Option<String>,
    pub display_name: String,
    pub role: String,
    pub department: Option<String>,
    pub semester: Option<String>,
    pub member_id: Option<String>,
    pub mobile: Option<String>,
    pub proof_file: Option<String>,
    pub proof_status: String,
    pub proof_reviewed_at: Option<DateTime<Utc>>,
    pub proof_rejection_reason: Option<String>,
    pub proof_uploaded_at: Option<DateTime<Utc>>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub profile_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for new user profiles.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_profiles)]
pub(crate) struct NewUserProfileRow<'a> {
    pub subject: &'a str,
    pub email: Option<&'a str>,
    pub display_name: &'a str,
    pub role: &'a str,
    pub department: Option<&'a str>,
    pub semester: Option<&'a str>,
    pub member_id: Option<&'a str>,
    pub mobile: Option<&'a str>,
    pub proof_file: Option<&'a str>,
    pub proof_status: &'a str,
    pub proof_reviewed_at: Option<DateTime<Utc>>,
    pub proof_rejection_reason: Option<&'a str>,
    pub proof_uploaded_at: Option<DateTime<Utc>>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub profile_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Columns written when a new proof document is attached. The review
/// columns are reset alongside so a verdict never outlives its document.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = user_profiles)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ProofFileUpdate<'a> {
    pub proof_file: &'a str,
    pub proof_status: &'a str,
    pub proof_reviewed_at: Option<DateTime<Utc>>,
    pub proof_rejection_reason: Option<&'a str>,
    pub proof_uploaded_at: DateTime<Utc>,
}

/// Columns written on profile completion.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = user_profiles)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ProfileCompletionUpdate<'a> {
    pub mobile: &'a str,
    pub department: &'a str,
    pub member_id: &'a str,
    pub profile_completed: bool,
    pub proof_file: &'a str,
    pub proof_status: &'a str,
    pub proof_reviewed_at: Option<DateTime<Utc>>,
    pub proof_rejection_reason: Option<&'a str>,
    pub proof_uploaded_at: DateTime<Utc>,
}

/// Descriptive columns an administrator may edit. Unset fields are left
/// out of the statement.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = user_profiles)]
pub(crate) struct MemberDetailsUpdate<'a> {
    pub display_name: Option<&'a str>,
    pub mobile: Option<&'a str>,
    pub department: Option<&'a str>,
    pub semester: Option<&'a str>,
    pub role: Option<&'a str>,
}

/// Proof review columns, written together.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = user_profiles)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ProofReviewUpdate<'a> {
    pub proof_status: &'a str,
    pub proof_reviewed_at: Option<DateTime<Utc>>,
    pub proof_rejection_reason: Option<&'a str>,
}

/// Row struct for reading from the admin_profiles table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = admin_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AdminProfileRow {
    pub subject: String,
    pub email: String,
    pub display_name: String,
    pub elevation_key_used: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for new administrator profiles.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = admin_profiles)]
pub(crate) struct NewAdminProfileRow<'a> {
    pub subject: &'a str,
    pub email: &'a str,
    pub display_name: &'a str,
    pub elevation_key_used: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Catalogue models
// ---------------------------------------------------------------------------

/// Row struct for reading from the content_items table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = content_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ContentItemRow {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub semester: Option<String>,
    pub premium: bool,
    pub price_minor: i64,
    pub featured: bool,
    pub cover_blob: Option<String>,
    pub document_blob: Option<String>,
    pub uploaded_by: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Insertable form of a content item.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = content_items)]
pub(crate) struct ContentItemValues<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub author: &'a str,
    pub description: Option<&'a str>,
    pub department: Option<&'a str>,
    pub semester: Option<&'a str>,
    pub premium: bool,
    pub price_minor: i64,
    pub featured: bool,
    pub cover_blob: Option<&'a str>,
    pub document_blob: Option<&'a str>,
    pub uploaded_by: Option<&'a str>,
    pub uploaded_at: DateTime<Utc>,
}

/// Insertable struct for purchase records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = purchases)]
pub(crate) struct NewPurchaseRow<'a> {
    pub subject: &'a str,
    pub item_id: Uuid,
    pub amount_minor: i64,
    pub purchased_at: DateTime<Utc>,
    pub transaction_ref: Option<&'a str>,
}

/// Row struct for reading from the purchases table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = purchases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PurchaseRow {
    pub subject: String,
    pub item_id: Uuid,
    pub amount_minor: i64,
    pub purchased_at: DateTime<Utc>,
    pub transaction_ref: Option<String>,
}

// ---------------------------------------------------------------------------
// Blob models
// ---------------------------------------------------------------------------

/// Blob metadata without the content column.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = blobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BlobMetadataRow {
    pub name: String,
    pub size: i64,
    pub content_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for stored blobs.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blobs)]
pub(crate) struct NewBlobRow<'a> {
    pub name: &'a str,
    pub content: &'a [u8],
    pub size: i64,
    pub content_type: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}
