//! Size and kind limits applied to uploads before they reach a blob store.

use std::fmt;

/// One KiB.
const KIB: usize = 1024;
/// One MiB.
const MIB: usize = 1024 * KIB;

/// What an upload is for; each purpose carries its own limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadKind {
    /// Proof-of-eligibility document attached to a member profile.
    IdProof,
    /// Primary document of a content item.
    Document,
    /// Cover image of a content item.
    CoverImage,
}

impl UploadKind {
    /// Largest accepted upload in bytes.
    #[must_use]
    pub const fn max_bytes(self) -> usize {
        match self {
            Self::IdProof => 512 * KIB,
            Self::Document => 25 * MIB,
            Self::CoverImage => 2 * MIB,
        }
    }

    /// Accepted lower-case extensions, or `None` when any extension is fine.
    #[must_use]
    pub const fn allowed_extensions(self) -> Option<&'static [&'static str]> {
        match self {
            Self::IdProof => Some(&["pdf", "jpg", "jpeg"]),
            Self::Document | Self::CoverImage => None,
        }
    }

    /// Directory prefix under which uploads of this kind are stored.
    #[must_use]
    pub const fn directory(self) -> &'static str {
        match self {
            Self::IdProof => "id-proofs",
            Self::Document => "books/pdfs",
            Self::CoverImage => "books/covers",
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IdProof => "id proof",
            Self::Document => "document",
            Self::CoverImage => "cover image",
        })
    }
}

/// Reasons an upload is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("uploaded {kind} is empty")]
    Empty { kind: UploadKind },
    #[error("{kind} must be at most {limit} bytes (got {actual})")]
    TooLarge {
        kind: UploadKind,
        limit: usize,
        actual: usize,
    },
    #[error("{kind} must be one of: {allowed}")]
    UnsupportedType { kind: UploadKind, allowed: String },
    #[error("a file name is required")]
    MissingFileName,
}

impl UploadRejection {
    /// Stable machine-readable code for error details.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Empty { .. } => "empty_upload",
            Self::TooLarge { .. } => "file_too_large",
            Self::UnsupportedType { .. } => "unsupported_file_type",
            Self::MissingFileName => "missing_file_name",
        }
    }
}

/// An upload that passed the policy checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedUpload {
    pub kind: UploadKind,
    /// Lower-cased extension from the client file name.
    pub extension: Option<String>,
    pub content: Vec<u8>,
    /// Content type declared by the client, if it parsed.
    pub content_type: Option<String>,
}

/// Check an upload against the limits for `kind`.
///
/// # Examples
/// ```
/// use library_backend::domain::{check_upload, UploadKind};
///
/// let ok = check_upload(UploadKind::IdProof, "scan.PDF", b"%PDF".to_vec(), None);
/// assert_eq!(ok.unwrap().extension.as_deref(), Some("pdf"));
///
/// let bad = check_upload(UploadKind::IdProof, "scan.png", b"png".to_vec(), None);
/// assert!(bad.is_err());
/// ```
pub fn check_upload(
    kind: UploadKind,
    file_name: &str,
    content: Vec<u8>,
    content_type: Option<&str>,
) -> Result<CheckedUpload, UploadRejection> {
    let file_name = file_name.trim();
    if file_name.is_empty() {
        return Err(UploadRejection::MissingFileName);
    }
    if content.is_empty() {
        return Err(UploadRejection::Empty { kind });
    }
    if content.len() > kind.max_bytes() {
        return Err(UploadRejection::TooLarge {
            kind,
            limit: kind.max_bytes(),
            actual: content.len(),
        });
    }

    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    if let Some(allowed) = kind.allowed_extensions() {
        let permitted = extension
            .as_deref()
            .is_some_and(|ext| allowed.contains(&ext));
        if !permitted {
            return Err(UploadRejection::UnsupportedType {
                kind,
                allowed: allowed.join(", "),
            });
        }
    }

    let content_type = content_type
        .and_then(|raw| raw.parse::<mime::Mime>().ok())
        .map(|parsed| parsed.essence_str().to_owned());

    Ok(CheckedUpload {
        kind,
        extension,
        content,
        content_type,
    })
}

impl From<UploadRejection> for super::Error {
    fn from(err: UploadRejection) -> Self {
        let code = err.code();
        Self::invalid_request(err.to_string()).with_reason(code)
    }
}

/// Blob name for a checked upload: `<directory>/<stem>.<extension>`.
///
/// # Examples
/// ```
/// use library_backend::domain::{check_upload, stored_name_for, UploadKind};
///
/// let upload = check_upload(UploadKind::CoverImage, "c.PNG", vec![1], None).unwrap();
/// let name = stored_name_for(&upload, "dune").unwrap();
/// assert_eq!(name.as_ref(), "books/covers/dune.png");
/// ```
pub fn stored_name_for(
    upload: &CheckedUpload,
    stem: &str,
) -> Result<super::BlobName, super::BlobNameError> {
    let file_name = match upload.extension.as_deref() {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem.to_owned(),
    };
    super::BlobName::in_directory(upload.kind.directory(), &file_name)
}
