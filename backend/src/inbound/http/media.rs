//! Stored file delivery.
//!
//! ```text
//! GET /api/v1/media/{name}?download=true
//! ```

use actix_web::body::SizedStream;
use actix_web::http::header;
use actix_web::web::Bytes;
use actix_web::{HttpResponse, get, web};
use futures_util::TryStreamExt;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct MediaQuery {
    /// Ask the client to save rather than display the file.
    #[serde(default)]
    pub download: bool,
}

/// Stream a stored file by its logical name.
#[utoipa::path(
    get,
    path = "/api/v1/media/{name}",
    params(
        ("name" = String, Path, description = "Logical file name, e.g. `books/covers/x.png`"),
        MediaQuery
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "No such file", body = ErrorSchema)
    ),
    tags = ["media"],
    operation_id = "serveMedia",
    security((), ("BearerToken" = []))
)]
#[get("/media/{name:.*}")]
pub async fn serve_media(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<MediaQuery>,
) -> ApiResult<HttpResponse> {
    let file = state.files.serve(&path, query.download).await?;
    let disposition = file.disposition.header_value(&file.file_name);
    let body = SizedStream::new(file.size, file.content.map_ok(Bytes::from));
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, file.content_type))
        .insert_header((header::CONTENT_DISPOSITION, disposition))
        .body(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::TestWorld;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use rstest::rstest;

    #[actix_web::test]
    async fn serves_stored_content_inline() {
        let world = TestWorld::new();
        world.seed_blob("books/covers/cover.png", b"png-bytes").await;

        let app = actix_web::test::init_service(
            actix_web::App::new()
                .app_data(world.state())
                .configure(crate::inbound::http::configure_api),
        )
        .await;
        let res = actix_web::test::call_service(
            &app,
            TestRequest::get()
                .uri("/api/v1/media/books/covers/cover.png")
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let headers = res.headers().clone();
        assert_eq!(
            headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("image/png")
        );
        assert_eq!(
            headers
                .get(header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok()),
            Some("inline; filename=\"cover.png\"")
        );
        let body = actix_web::test::read_body(res).await;
        assert_eq!(body.as_ref(), b"png-bytes");
    }

    #[actix_web::test]
    async fn download_requests_an_attachment() {
        let world = TestWorld::new();
        world.seed_blob("books/pdfs/notes.pdf", b"%PDF").await;

        let app = actix_web::test::init_service(
            actix_web::App::new()
                .app_data(world.state())
                .configure(crate::inbound::http::configure_api),
        )
        .await;
        let res = actix_web::test::call_service(
            &app,
            TestRequest::get()
                .uri("/api/v1/media/books/pdfs/notes.pdf?download=true")
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok()),
            Some("attachment; filename=\"notes.pdf\"")
        );
    }

    #[rstest]
    #[case("books/covers/missing.png")]
    #[case("books/covers/bad%20name.png")]
    #[actix_web::test]
    async fn unknown_or_malformed_names_are_not_found(#[case] name: &str) {
        let world = TestWorld::new();

        let (status, body) = world
            .send(TestRequest::get().uri(&format!("/api/v1/media/{name}")))
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }
}
