//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler and the health checks, the
//! error schema wrappers from [`crate::inbound::http::schemas`], and the
//! bearer token security scheme. Request and response bodies referenced by
//! the paths are collected automatically.
//!
//! Swagger UI serves the document in debug builds; `openapi-dump` prints it.

use crate::inbound::http::dto::{
    AccessResponse, AccountUpdateResponse, AdminProfileResponse, BookDetailsResponse,
    BookListResponse, BookResponse, LibraryResponse, MemberDetailsResponse, ProfileResponse,
    PurchaseHistoryResponse, UserProfileResponse,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Add the bearer token scheme referenced by protected operations.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Access token issued by the identity service."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Library backend API",
        description = "Member registration, catalogue entitlement and file delivery for a digital library."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::register_user,
        crate::inbound::http::users::sync_profile,
        crate::inbound::http::users::complete_profile,
        crate::inbound::http::users::current_profile,
        crate::inbound::http::users::upload_id_proof,
        crate::inbound::http::users::purchase_history,
        crate::inbound::http::users::library,
        crate::inbound::http::admin::register_admin,
        crate::inbound::http::admin::list_members,
        crate::inbound::http::admin::member_details,
        crate::inbound::http::admin::update_member,
        crate::inbound::http::admin::set_suspension,
        crate::inbound::http::admin::review_proof,
        crate::inbound::http::admin::password_reset,
        crate::inbound::http::books::list_books,
        crate::inbound::http::books::create_book,
        crate::inbound::http::books::book_details,
        crate::inbound::http::books::book_access,
        crate::inbound::http::books::replace_cover,
        crate::inbound::http::books::replace_document,
        crate::inbound::http::books::delete_book,
        crate::inbound::http::books::verify_payment,
        crate::inbound::http::media::serve_media,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        UserProfileResponse,
        AdminProfileResponse,
        ProfileResponse,
        BookResponse,
        BookListResponse,
        BookDetailsResponse,
        PurchaseHistoryResponse,
        LibraryResponse,
        MemberDetailsResponse,
        AccessResponse,
        AccountUpdateResponse,
    )),
    tags(
        (name = "users", description = "Member registration and profiles"),
        (name = "admin", description = "Administrator operations"),
        (name = "books", description = "Catalogue, entitlement and purchases"),
        (name = "media", description = "Stored file delivery"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
