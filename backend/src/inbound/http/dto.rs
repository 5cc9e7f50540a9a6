//! Wire representations of profiles and catalogue items.
//!
//! Domain types stay free of serde naming concerns; these DTOs fix the JSON
//! field names clients depend on.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    AccessDecision, AdminProfile, ContentItem, ItemView, LibraryEntry, MemberDetails,
    ProfileRecord, ProofStatus, PurchaseLine, UserProfile,
};

use super::state::HttpState;

/// Member profile as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    pub uid: String,
    pub email: Option<String>,
    pub name: String,
    /// `student`, `faculty` or `alumni`.
    pub role: String,
    pub department: Option<String>,
    pub semester: Option<String>,
    pub member_id: Option<String>,
    pub mobile: Option<String>,
    pub id_proof_url: Option<String>,
    pub id_proof_uploaded_at: Option<DateTime<Utc>>,
    /// `unverified`, `verified` or `rejected`.
    pub id_proof_status: String,
    pub id_verified_at: Option<DateTime<Utc>>,
    pub id_rejected_at: Option<DateTime<Utc>>,
    pub id_rejection_reason: Option<String>,
    pub suspended: bool,
    pub suspended_at: Option<DateTime<Utc>>,
    pub profile_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl UserProfileResponse {
    pub fn from_profile(profile: &UserProfile, state: &HttpState) -> Self {
        let (status, verified_at, rejected_at, reason) = match &profile.proof.status {
            ProofStatus::Unverified => ("unverified", None, None, None),
            ProofStatus::Verified { verified_at } => ("verified", Some(*verified_at), None, None),
            ProofStatus::Rejected {
                reason,
                rejected_at,
            } => ("rejected", None, Some(*rejected_at), Some(reason.clone())),
        };
        Self {
            uid: profile.subject.to_string(),
            email: profile.email.clone(),
            name: profile.display_name.clone(),
            role: profile.role.as_str().to_owned(),
            department: profile.department.as_ref().map(ToString::to_string),
            semester: profile.semester.clone(),
            member_id: profile.member_id.as_ref().map(|id| id.as_ref().to_owned()),
            mobile: profile.mobile.clone(),
            id_proof_url: profile.proof.file.as_ref().map(|name| state.media_url(name)),
            id_proof_uploaded_at: profile.proof.uploaded_at,
            id_proof_status: status.to_owned(),
            id_verified_at: verified_at,
            id_rejected_at: rejected_at,
            id_rejection_reason: reason,
            suspended: profile.is_suspended(),
            suspended_at: profile.suspended_at,
            profile_completed: profile.profile_completed,
            created_at: profile.created_at,
        }
    }
}

/// Administrator profile as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfileResponse {
    pub uid: String,
    pub email: String,
    pub name: String,
    /// Always `admin`.
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<&AdminProfile> for AdminProfileResponse {
    fn from(profile: &AdminProfile) -> Self {
        Self {
            uid: profile.subject.to_string(),
            email: profile.email.clone(),
            name: profile.display_name.clone(),
            role: "admin".to_owned(),
            created_at: profile.created_at,
        }
    }
}

/// Either profile class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum ProfileResponse {
    User(UserProfileResponse),
    Admin(AdminProfileResponse),
}

impl ProfileResponse {
    pub fn from_record(record: &ProfileRecord, state: &HttpState) -> Self {
        match record {
            ProfileRecord::User(profile) => {
                Self::User(UserProfileResponse::from_profile(profile, state))
            }
            ProfileRecord::Admin(profile) => Self::Admin(profile.into()),
        }
    }
}

/// Catalogue item as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub semester: Option<String>,
    pub premium: bool,
    /// Price in minor currency units.
    pub price: u64,
    pub featured: bool,
    pub cover_url: Option<String>,
    pub document_url: Option<String>,
    pub uploaded_by: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl BookResponse {
    pub fn from_item(item: &ContentItem, state: &HttpState) -> Self {
        Self {
            id: item.id.to_string(),
            title: item.title.clone(),
            author: item.author.clone(),
            description: item.description.clone(),
            department: item.department.clone(),
            semester: item.semester.clone(),
            premium: item.premium,
            price: item.price.minor_units(),
            featured: item.featured,
            cover_url: item.cover.as_ref().map(|name| state.media_url(name)),
            document_url: item.document.as_ref().map(|name| state.media_url(name)),
            uploaded_by: item.uploaded_by.as_ref().map(ToString::to_string),
            uploaded_at: item.uploaded_at,
        }
    }
}

/// Catalogue listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct BookListResponse {
    pub books: Vec<BookResponse>,
    pub count: usize,
}

/// One purchase with the title and author of what was bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLineResponse {
    #[schema(value_type = String, format = Uuid)]
    pub book_id: String,
    /// Absent once the item has been removed from the catalogue.
    pub book_title: Option<String>,
    pub book_author: Option<String>,
    /// Amount paid in minor currency units.
    pub amount: u64,
    pub purchased_at: DateTime<Utc>,
    pub transaction_ref: Option<String>,
}

impl From<&PurchaseLine> for PurchaseLineResponse {
    fn from(line: &PurchaseLine) -> Self {
        Self {
            book_id: line.purchase.item.to_string(),
            book_title: line.item.as_ref().map(|item| item.title.clone()),
            book_author: line.item.as_ref().map(|item| item.author.clone()),
            amount: line.purchase.amount.minor_units(),
            purchased_at: line.purchase.purchased_at,
            transaction_ref: line.purchase.transaction_ref.clone(),
        }
    }
}

/// The caller's purchases, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct PurchaseHistoryResponse {
    pub purchases: Vec<PurchaseLineResponse>,
    pub count: usize,
}

impl From<&[PurchaseLine]> for PurchaseHistoryResponse {
    fn from(lines: &[PurchaseLine]) -> Self {
        Self {
            purchases: lines.iter().map(PurchaseLineResponse::from).collect(),
            count: lines.len(),
        }
    }
}

/// An item on the caller's shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntryResponse {
    #[serde(flatten)]
    pub book: BookResponse,
    /// `free` or `purchased`.
    pub access_type: String,
}

/// Everything the caller may read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct LibraryResponse {
    pub library: Vec<LibraryEntryResponse>,
    pub count: usize,
}

impl LibraryResponse {
    pub fn from_entries(entries: &[LibraryEntry], state: &HttpState) -> Self {
        Self {
            library: entries
                .iter()
                .map(|entry| LibraryEntryResponse {
                    book: BookResponse::from_item(&entry.item, state),
                    access_type: entry.access.as_str().to_owned(),
                })
                .collect(),
            count: entries.len(),
        }
    }
}

/// Member record with purchase history, for administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetailsResponse {
    #[serde(flatten)]
    pub profile: UserProfileResponse,
    pub purchase_history: Vec<PurchaseLineResponse>,
}

impl MemberDetailsResponse {
    pub fn from_details(details: &MemberDetails, state: &HttpState) -> Self {
        Self {
            profile: UserProfileResponse::from_profile(&details.profile, state),
            purchase_history: details.purchases.iter().map(PurchaseLineResponse::from).collect(),
        }
    }
}

/// Item details together with the caller's access decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookDetailsResponse {
    #[serde(flatten)]
    pub book: BookResponse,
    pub has_access: bool,
    /// `free`, `purchased`, `missing_id_proof` or `not-purchased`.
    pub access_reason: String,
}

impl BookDetailsResponse {
    pub fn from_view(view: &ItemView, state: &HttpState) -> Self {
        let mut book = BookResponse::from_item(&view.item, state);
        book.cover_url.clone_from(&view.cover_url);
        book.document_url.clone_from(&view.document_url);
        Self {
            book,
            has_access: view.access.allowed,
            access_reason: view.access.reason.as_str().to_owned(),
        }
    }
}

/// Entitlement decision for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct AccessResponse {
    pub allowed: bool,
    /// `free`, `purchased`, `missing_id_proof` or `not-purchased`.
    pub reason: String,
}

impl From<AccessDecision> for AccessResponse {
    fn from(decision: AccessDecision) -> Self {
        Self {
            allowed: decision.allowed,
            reason: decision.reason.as_str().to_owned(),
        }
    }
}

/// Outcome of an account mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct AccountUpdateResponse {
    pub success: bool,
    pub message: String,
}

impl From<crate::domain::AccountUpdate> for AccountUpdateResponse {
    fn from(update: crate::domain::AccountUpdate) -> Self {
        Self {
            success: update.success,
            message: update.message,
        }
    }
}
