//! Name-addressed binary blobs.
//!
//! Blob names are relative, `/`-separated paths forming a single namespace
//! across every store implementation. A save under a taken name is redirected
//! to a disambiguated variant rather than overwriting the existing blob.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Maximum length of a blob name in bytes.
pub const BLOB_NAME_MAX: usize = 255;

/// Length of the random suffix appended to colliding names.
pub const DISAMBIGUATION_SUFFIX_LEN: usize = 7;

/// How many names a store tries before giving up on a save.
pub const MAX_NAME_ATTEMPTS: usize = 8;

/// Validation errors for blob names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobNameError {
    #[error("blob name must not be empty")]
    Empty,
    #[error("blob name must be at most {max} bytes")]
    TooLong { max: usize },
    #[error("blob name must be a relative path without empty, '.' or '..' segments")]
    InvalidSegment,
    #[error("blob name may only contain ASCII letters, digits, '.', '_', '-' and '/'")]
    InvalidCharacters,
}

/// Logical name of a stored blob.
///
/// # Examples
/// ```
/// use library_backend::domain::BlobName;
///
/// let name = BlobName::new("covers/dune.png").expect("valid name");
/// assert_eq!(name.file_name(), "dune.png");
/// assert_eq!(name.extension(), Some("png"));
/// assert!(BlobName::new("../etc/passwd").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobName(String);

impl BlobName {
    pub fn new(raw: impl Into<String>) -> Result<Self, BlobNameError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(BlobNameError::Empty);
        }
        if raw.len() > BLOB_NAME_MAX {
            return Err(BlobNameError::TooLong { max: BLOB_NAME_MAX });
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
        {
            return Err(BlobNameError::InvalidCharacters);
        }
        if raw
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(BlobNameError::InvalidSegment);
        }
        Ok(Self(raw))
    }

    /// Join a directory prefix and a file name.
    pub fn in_directory(directory: &str, file_name: &str) -> Result<Self, BlobNameError> {
        Self::new(format!("{directory}/{file_name}"))
    }

    /// Last path segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(self.0.as_str())
    }

    /// Extension of the last segment, without the dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let (stem, ext) = self.file_name().rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            None
        } else {
            Some(ext)
        }
    }

    /// Insert `_<suffix>` before the extension of the last segment.
    ///
    /// `covers/dune.png` becomes `covers/dune_<suffix>.png`. The stem of the
    /// last segment is shortened when needed so the result stays within
    /// [`BLOB_NAME_MAX`].
    pub fn with_suffix(&self, suffix: &str) -> Result<Self, BlobNameError> {
        let ext = self.extension();
        let base_len = ext.map_or(self.0.len(), |ext| self.0.len() - ext.len() - 1);
        let tail_len = 1 + suffix.len() + ext.map_or(0, |ext| ext.len() + 1);
        let directory_len = self.0.len() - self.file_name().len();
        let keep = BLOB_NAME_MAX
            .saturating_sub(tail_len)
            .max(directory_len + 1)
            .min(base_len);
        let base = self.0.get(..keep).unwrap_or(self.0.as_str());
        let raw = match ext {
            Some(ext) => format!("{base}_{suffix}.{ext}"),
            None => format!("{base}_{suffix}"),
        };
        Self::new(raw)
    }

    /// Disambiguated variant using a random alphanumeric suffix.
    pub fn disambiguate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Self, BlobNameError> {
        let suffix: String = rng
            .sample_iter(&Alphanumeric)
            .take(DISAMBIGUATION_SUFFIX_LEN)
            .map(char::from)
            .collect();
        self.with_suffix(&suffix)
    }

    /// Candidate names for a save: the requested name first, then random
    /// variants, [`MAX_NAME_ATTEMPTS`] in total.
    #[must_use]
    pub fn save_candidates(&self) -> Vec<Self> {
        let mut rng = rand::thread_rng();
        let mut candidates = Vec::with_capacity(MAX_NAME_ATTEMPTS);
        candidates.push(self.clone());
        while candidates.len() < MAX_NAME_ATTEMPTS {
            match self.disambiguate(&mut rng) {
                Ok(candidate) => candidates.push(candidate),
                // Only fails when the directory leaves no room for a suffix.
                Err(_) => break,
            }
        }
        candidates
    }
}

impl AsRef<str> for BlobName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BlobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<BlobName> for String {
    fn from(value: BlobName) -> Self {
        value.0
    }
}

impl TryFrom<String> for BlobName {
    type Error = BlobNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Metadata recorded alongside blob content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    pub name: BlobName,
    /// Stored length in bytes.
    pub size: u64,
    /// Content type declared at upload time; advisory only.
    pub content_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Builds public locators for blobs.
///
/// Locators expose only the logical name under a fixed path prefix.
///
/// # Examples
/// ```
/// use library_backend::domain::{BlobName, MediaLocator};
///
/// let locator = MediaLocator::new("/api/v1/media/");
/// let name = BlobName::new("id-proofs/u1_x.pdf").unwrap();
/// assert_eq!(locator.url_for(&name), "/api/v1/media/id-proofs/u1_x.pdf");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLocator {
    prefix: String,
}

impl MediaLocator {
    #[must_use]
    pub fn new(prefix: impl AsRef<str>) -> Self {
        Self {
            prefix: prefix.as_ref().trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn url_for(&self, name: &BlobName) -> String {
        format!("{}/{name}", self.prefix)
    }
}

impl Default for MediaLocator {
    fn default() -> Self {
        Self::new("/api/v1/media")
    }
}

/// Reduce arbitrary text to a single valid name segment.
///
/// Characters outside `[A-Za-z0-9_-]` become `-`; an empty result becomes
/// `file`.
///
/// # Examples
/// ```
/// use library_backend::domain::safe_segment;
///
/// assert_eq!(safe_segment("auth0|abc.def"), "auth0-abc-def");
/// assert_eq!(safe_segment(""), "file");
/// ```
#[must_use]
pub fn safe_segment(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_owned()
    } else {
        cleaned
    }
}

impl From<BlobNameError> for super::Error {
    fn from(err: BlobNameError) -> Self {
        Self::invalid_request(err.to_string())
            .with_reason("invalid_file_name")
    }
}
