//! Name-addressed file delivery.

use std::sync::Arc;

use tracing::debug;

use super::ports::{BlobChunks, BlobStore};
use super::{BlobName, Error};

/// How the client should present the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    /// `Content-Disposition` header value for `file_name`.
    ///
    /// # Examples
    /// ```
    /// use library_backend::domain::Disposition;
    ///
    /// assert_eq!(
    ///     Disposition::Attachment.header_value("book.pdf"),
    ///     "attachment; filename=\"book.pdf\""
    /// );
    /// ```
    #[must_use]
    pub fn header_value(self, file_name: &str) -> String {
        let kind = match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
        };
        format!("{kind}; filename=\"{file_name}\"")
    }
}

/// A file ready to be streamed to a client.
pub struct ServedFile {
    pub content_type: String,
    pub disposition: Disposition,
    pub file_name: String,
    pub size: u64,
    pub content: BlobChunks,
}

impl std::fmt::Debug for ServedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServedFile")
            .field("content_type", &self.content_type)
            .field("disposition", &self.disposition)
            .field("file_name", &self.file_name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Resolves logical names through the blob store.
#[derive(Clone)]
pub struct FileServingGateway {
    blobs: Arc<dyn BlobStore>,
}

impl FileServingGateway {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Open `name` for delivery.
    ///
    /// # Errors
    /// `not_found` for names that are malformed or have no stored blob.
    pub async fn serve(&self, name: &str, download: bool) -> Result<ServedFile, Error> {
        let Ok(blob_name) = BlobName::new(name) else {
            debug!(name, "rejected malformed file name");
            return Err(file_not_found());
        };
        let Some(opened) = self.blobs.open(&blob_name).await? else {
            return Err(file_not_found());
        };

        let content_type = opened
            .metadata
            .content_type
            .as_deref()
            .and_then(|declared| declared.parse::<mime::Mime>().ok())
            .unwrap_or_else(|| content_type_for(&blob_name))
            .to_string();
        let disposition = if download {
            Disposition::Attachment
        } else {
            Disposition::Inline
        };

        Ok(ServedFile {
            content_type,
            disposition,
            file_name: blob_name.file_name().to_owned(),
            size: opened.metadata.size,
            content: opened.content,
        })
    }
}

fn file_not_found() -> Error {
    Error::not_found("file not found").with_reason("not_found")
}

/// Guess a content type from the name's extension.
///
/// # Examples
/// ```
/// use library_backend::domain::{BlobName, content_type_for};
///
/// let name = BlobName::new("covers/x.JPG").unwrap();
/// assert_eq!(content_type_for(&name), mime::IMAGE_JPEG);
/// ```
#[must_use]
pub fn content_type_for(name: &BlobName) -> mime::Mime {
    let Some(ext) = name.extension() else {
        return mime::APPLICATION_OCTET_STREAM;
    };
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => mime::APPLICATION_PDF,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "png" => mime::IMAGE_PNG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "svg" => mime::IMAGE_SVG,
        "txt" => mime::TEXT_PLAIN,
        "csv" => mime::TEXT_CSV,
        "html" | "htm" => mime::TEXT_HTML,
        "json" => mime::APPLICATION_JSON,
        "webp" => parse_or_default("image/webp"),
        "epub" => parse_or_default("application/epub+zip"),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

fn parse_or_default(raw: &str) -> mime::Mime {
    raw.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}
