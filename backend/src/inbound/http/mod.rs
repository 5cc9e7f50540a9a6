//! HTTP inbound adapter exposing REST endpoints.
//!
//! Every route under `/api/v1` passes through [`identity::IdentityGate`]
//! before its handler runs. Health checks live outside that scope.

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, web};

use crate::domain::Error;

pub mod admin;
pub mod books;
pub mod dto;
pub mod error;
pub mod health;
pub mod identity;
pub mod media;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod uploads;
pub mod users;

pub use error::ApiResult;

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("invalid JSON body: {err}")).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("invalid query string: {err}")).into()
}

/// Register the `/api/v1` scope with its extractor limits and handlers.
///
/// Expects `web::Data<HttpState>` on the application.
///
/// # Examples
/// ```no_run
/// use actix_web::App;
/// use library_backend::inbound::http::configure_api;
///
/// let _app = App::new().configure(configure_api);
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .wrap(identity::IdentityGate)
            .app_data(web::PayloadConfig::new(uploads::MAX_UPLOAD_BYTES))
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .service(users::register_user)
            .service(users::sync_profile)
            .service(users::complete_profile)
            .service(users::current_profile)
            .service(users::upload_id_proof)
            .service(users::purchase_history)
            .service(users::library)
            .service(admin::register_admin)
            .service(admin::list_members)
            .service(admin::member_details)
            .service(admin::update_member)
            .service(admin::set_suspension)
            .service(admin::review_proof)
            .service(admin::password_reset)
            .service(books::list_books)
            .service(books::create_book)
            .service(books::book_access)
            .service(books::book_details)
            .service(books::replace_cover)
            .service(books::replace_document)
            .service(books::delete_book)
            .service(books::verify_payment)
            .service(media::serve_media),
    );
}
