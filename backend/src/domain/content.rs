//! Catalogue content items, purchases and access decisions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BlobName, SubjectId, UploadKind};

/// Stable identifier of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentItemId(Uuid);

impl ContentItemId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ContentItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ContentItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Price in minor currency units (paise, cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    #[must_use]
    pub const fn from_minor_units(units: u64) -> Self {
        Self(units)
    }

    #[must_use]
    pub const fn minor_units(self) -> u64 {
        self.0
    }
}

/// A catalogued book or document.
///
/// `premium` alone decides whether access needs a purchase; a premium item
/// priced at zero still does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: ContentItemId,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub semester: Option<String>,
    pub premium: bool,
    pub price: Price,
    /// Highlighted in catalogue listings.
    pub featured: bool,
    pub cover: Option<BlobName>,
    pub document: Option<BlobName>,
    pub uploaded_by: Option<SubjectId>,
    pub uploaded_at: DateTime<Utc>,
}

/// A stored file of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFile {
    Cover,
    Document,
}

impl ItemFile {
    /// Upload rules that apply to this file.
    #[must_use]
    pub const fn kind(self) -> UploadKind {
        match self {
            Self::Cover => UploadKind::CoverImage,
            Self::Document => UploadKind::Document,
        }
    }
}

/// Catalogue listing filter. Unset fields match every item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub department: Option<String>,
    pub semester: Option<String>,
    pub premium: Option<bool>,
    pub featured: Option<bool>,
    /// Case-insensitive substring of the title or author.
    pub search: Option<String>,
}

impl ItemFilter {
    /// Whether `item` passes every set criterion.
    ///
    /// # Examples
    /// ```
    /// use library_backend::domain::ItemFilter;
    ///
    /// let filter = ItemFilter { premium: Some(false), ..ItemFilter::default() };
    /// assert_eq!(filter.premium, Some(false));
    /// ```
    #[must_use]
    pub fn matches(&self, item: &ContentItem) -> bool {
        let same = |wanted: Option<&String>, actual: Option<&String>| {
            wanted.is_none_or(|wanted| actual == Some(wanted))
        };
        same(self.department.as_ref(), item.department.as_ref())
            && same(self.semester.as_ref(), item.semester.as_ref())
            && self.premium.is_none_or(|premium| item.premium == premium)
            && self.featured.is_none_or(|featured| item.featured == featured)
            && self.search.as_deref().is_none_or(|needle| {
                let needle = needle.to_lowercase();
                item.title.to_lowercase().contains(&needle)
                    || item.author.to_lowercase().contains(&needle)
            })
    }
}

/// An item in a member's library and why they hold it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub item: ContentItem,
    /// [`AccessReason::Free`] or [`AccessReason::Purchased`].
    pub access: AccessReason,
}

/// Record of a member buying a premium item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub subject: SubjectId,
    pub item: ContentItemId,
    pub amount: Price,
    pub purchased_at: DateTime<Utc>,
    pub transaction_ref: Option<String>,
}

/// A purchase together with the item it bought, while that item exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseLine {
    pub purchase: Purchase,
    pub item: Option<ContentItem>,
}

/// Why access was granted or refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessReason {
    /// The item is not premium.
    #[serde(rename = "free")]
    Free,
    /// The caller bought the item.
    #[serde(rename = "purchased")]
    Purchased,
    /// The caller is signed in but has no stored proof of eligibility.
    #[serde(rename = "missing_id_proof")]
    MissingIdProof,
    /// The item is premium and the caller has not bought it.
    #[serde(rename = "not-purchased")]
    NotPurchased,
}

impl AccessReason {
    /// Wire label of the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Purchased => "purchased",
            Self::MissingIdProof => "missing_id_proof",
            Self::NotPurchased => "not-purchased",
        }
    }
}

impl fmt::Display for AccessReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an entitlement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    #[must_use]
    pub const fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    #[must_use]
    pub const fn deny(reason: AccessReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Payment identifiers returned by the payment provider's checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub payment_id: String,
    pub order_id: String,
    pub signature: Option<String>,
}
