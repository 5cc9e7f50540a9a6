//! Raw-body upload plumbing shared by the user and catalogue handlers.
//!
//! Uploads arrive as the request body with the client file name in the
//! `filename` query parameter and the media type in `Content-Type`.

use actix_web::HttpRequest;
use actix_web::http::header;
use serde::Deserialize;

use crate::domain::UploadKind;

/// Largest request body accepted on upload routes. Per-kind limits are
/// enforced by the domain upload policy.
pub const MAX_UPLOAD_BYTES: usize = UploadKind::Document.max_bytes();

/// `?filename=` query of upload routes.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Client-side file name; its extension decides the stored name.
    pub filename: Option<String>,
}

impl UploadQuery {
    pub fn file_name(self) -> String {
        self.filename.unwrap_or_default()
    }
}

/// Media type declared by the client, if any.
pub fn declared_content_type(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}
