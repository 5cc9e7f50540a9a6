//! Catalogue and entitlement API handlers.
//!
//! ```text
//! GET    /api/v1/books                       List catalogue items
//! POST   /api/v1/books                       Create a catalogue item
//! GET    /api/v1/books/{id}                  Item details with access decision
//! GET    /api/v1/books/{id}/access           Access decision only
//! PUT    /api/v1/books/{id}/cover            Replace the cover image
//! PUT    /api/v1/books/{id}/document         Replace the document
//! DELETE /api/v1/books/{id}                  Remove an item and its files
//! POST   /api/v1/books/{id}/verify-payment   Record a confirmed purchase
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ContentItemId, Error, ItemFilter, ItemUpload, NewContentItem, PaymentConfirmation, Price,
    Purchase,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{
    AccessResponse, BookDetailsResponse, BookListResponse, BookResponse,
};
use crate::inbound::http::identity::Caller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::uploads::{UploadQuery, declared_content_type};

/// Catalogue item creation request body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub premium: bool,
    /// Price in minor currency units; ignored for free items.
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub featured: bool,
}

impl From<CreateBookRequest> for NewContentItem {
    fn from(value: CreateBookRequest) -> Self {
        Self {
            title: value.title,
            author: value.author,
            description: value.description,
            department: value.department,
            semester: value.semester,
            premium: value.premium,
            price: Price::from_minor_units(value.price),
            featured: value.featured,
        }
    }
}

/// Catalogue listing filters. Blank values are ignored.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookListQuery {
    pub department: Option<String>,
    pub semester: Option<String>,
    pub is_premium: Option<bool>,
    pub featured: Option<bool>,
    /// Matched against title and author, ignoring case.
    pub search: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
}

impl From<BookListQuery> for ItemFilter {
    fn from(value: BookListQuery) -> Self {
        Self {
            department: non_blank(value.department),
            semester: non_blank(value.semester),
            premium: value.is_premium,
            featured: value.featured,
            search: non_blank(value.search),
        }
    }
}

/// Payment identifiers returned by the checkout.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub payment_id: String,
    pub order_id: String,
    #[serde(default)]
    pub signature: Option<String>,
}

impl From<VerifyPaymentRequest> for PaymentConfirmation {
    fn from(value: VerifyPaymentRequest) -> Self {
        Self {
            payment_id: value.payment_id,
            order_id: value.order_id,
            signature: value.signature,
        }
    }
}

/// Recorded purchase.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    #[schema(value_type = String, format = Uuid)]
    pub item_id: String,
    /// Amount paid in minor currency units.
    pub amount: u64,
    pub purchased_at: DateTime<Utc>,
    pub transaction_ref: Option<String>,
}

impl From<Purchase> for PurchaseResponse {
    fn from(value: Purchase) -> Self {
        Self {
            item_id: value.item.to_string(),
            amount: value.amount.minor_units(),
            purchased_at: value.purchased_at,
            transaction_ref: value.transaction_ref,
        }
    }
}

/// Reply to a verified payment.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub purchase: PurchaseResponse,
}

/// Unknown and malformed identifiers are both reported as missing.
fn item_id(raw: &str) -> Result<ContentItemId, Error> {
    raw.parse().map_err(|_| {
        Error::not_found("book not found").with_reason("not_found")
    })
}

fn item_upload(req: &HttpRequest, query: UploadQuery, body: &web::Bytes) -> ItemUpload {
    ItemUpload {
        file_name: query.file_name(),
        content: body.to_vec(),
        content_type: declared_content_type(req),
    }
}

/// List catalogue items, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/books",
    params(BookListQuery),
    responses(
        (status = 200, description = "Matching items", body = BookListResponse),
        (status = 400, description = "Invalid query", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "listBooks",
    security((), ("BearerToken" = []))
)]
#[get("/books")]
pub async fn list_books(
    state: web::Data<HttpState>,
    query: web::Query<BookListQuery>,
) -> ApiResult<web::Json<BookListResponse>> {
    let items = state
        .catalogue
        .list_items(&query.into_inner().into())
        .await?;
    let books: Vec<BookResponse> = items
        .iter()
        .map(|item| BookResponse::from_item(item, &state))
        .collect();
    Ok(web::Json(BookListResponse {
        count: books.len(),
        books,
    }))
}

/// Add a catalogue item without files.
#[utoipa::path(
    post,
    path = "/api/v1/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Item created", body = BookResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "createBook",
    security(("BearerToken" = []))
)]
#[post("/books")]
pub async fn create_book(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<CreateBookRequest>,
) -> ApiResult<HttpResponse> {
    let item = state
        .catalogue
        .create_item(caller.context(), payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(BookResponse::from_item(&item, &state)))
}

/// Item details together with the caller's access decision.
#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 200, description = "Item details", body = BookDetailsResponse),
        (status = 404, description = "Unknown item", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "bookDetails",
    security((), ("BearerToken" = []))
)]
#[get("/books/{id}")]
pub async fn book_details(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookDetailsResponse>> {
    let id = item_id(&path)?;
    let view = state.catalogue.item_details(caller.context(), id).await?;
    Ok(web::Json(BookDetailsResponse::from_view(&view, &state)))
}

/// Decide whether the caller may open an item.
///
/// Refusals are `200` responses with `allowed: false`.
#[utoipa::path(
    get,
    path = "/api/v1/books/{id}/access",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 200, description = "Access decision", body = AccessResponse),
        (status = 404, description = "Unknown item", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "bookAccess",
    security((), ("BearerToken" = []))
)]
#[get("/books/{id}/access")]
pub async fn book_access(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
) -> ApiResult<web::Json<AccessResponse>> {
    let id = item_id(&path)?;
    let decision = state.catalogue.check_access(caller.context(), id).await?;
    Ok(web::Json(decision.into()))
}

/// Replace an item's cover image with the request body.
#[utoipa::path(
    put,
    path = "/api/v1/books/{id}/cover",
    params(("id" = String, Path, description = "Item identifier"), UploadQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Cover replaced", body = BookResponse),
        (status = 400, description = "Invalid upload", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "replaceCover",
    security(("BearerToken" = []))
)]
#[put("/books/{id}/cover")]
pub async fn replace_cover(
    state: web::Data<HttpState>,
    caller: Caller,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> ApiResult<web::Json<BookResponse>> {
    let id = item_id(&path)?;
    let upload = item_upload(&req, query.into_inner(), &body);
    let item = state
        .catalogue
        .replace_cover(caller.context(), id, upload)
        .await?;
    Ok(web::Json(BookResponse::from_item(&item, &state)))
}

/// Replace an item's document with the request body.
#[utoipa::path(
    put,
    path = "/api/v1/books/{id}/document",
    params(("id" = String, Path, description = "Item identifier"), UploadQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Document replaced", body = BookResponse),
        (status = 400, description = "Invalid upload", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "replaceDocument",
    security(("BearerToken" = []))
)]
#[put("/books/{id}/document")]
pub async fn replace_document(
    state: web::Data<HttpState>,
    caller: Caller,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> ApiResult<web::Json<BookResponse>> {
    let id = item_id(&path)?;
    let upload = item_upload(&req, query.into_inner(), &body);
    let item = state
        .catalogue
        .replace_document(caller.context(), id, upload)
        .await?;
    Ok(web::Json(BookResponse::from_item(&item, &state)))
}

/// Remove an item and both of its files.
#[utoipa::path(
    delete,
    path = "/api/v1/books/{id}",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 204, description = "Item removed"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "deleteBook",
    security(("BearerToken" = []))
)]
#[delete("/books/{id}")]
pub async fn delete_book(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = item_id(&path)?;
    state.catalogue.delete_item(caller.context(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Record a purchase once the payment provider confirms it.
#[utoipa::path(
    post,
    path = "/api/v1/books/{id}/verify-payment",
    params(("id" = String, Path, description = "Item identifier")),
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Purchase recorded", body = VerifyPaymentResponse),
        (status = 400, description = "Payment not verified", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "No member profile", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema),
        (status = 409, description = "Already purchased", body = ErrorSchema)
    ),
    tags = ["books"],
    operation_id = "verifyPayment",
    security(("BearerToken" = []))
)]
#[post("/books/{id}/verify-payment")]
pub async fn verify_payment(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
    payload: web::Json<VerifyPaymentRequest>,
) -> ApiResult<web::Json<VerifyPaymentResponse>> {
    let id = item_id(&path)?;
    let purchase = state
        .purchases
        .record_purchase(caller.context(), id, payload.into_inner().into())
        .await?;
    Ok(web::Json(VerifyPaymentResponse {
        success: true,
        purchase: purchase.into(),
    }))
}

#[cfg(test)]
mod tests;
