//! Member account API handlers.
//!
//! ```text
//! POST /api/v1/users/register      Register a member profile
//! POST /api/v1/users/sync          Create or refresh the caller's profile
//! POST /api/v1/users/me/complete   Complete the profile with a proof document
//! GET  /api/v1/users/me            Fetch the caller's profile
//! POST /api/v1/users/me/id-proof   Replace the proof document
//! GET  /api/v1/users/me/purchases  The caller's purchases
//! GET  /api/v1/users/me/library    Free and purchased items
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Error, ProfileCompletion, ProofUpload, UserRegistration, profile_not_synchronised,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{
    LibraryResponse, ProfileResponse, PurchaseHistoryResponse, UserProfileResponse,
};
use crate::inbound::http::identity::Caller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::uploads::{UploadQuery, declared_content_type};

/// Member registration request body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub mobile: String,
    /// Department code, for example `CSE`.
    pub department: String,
}

impl From<RegisterUserRequest> for UserRegistration {
    fn from(value: RegisterUserRequest) -> Self {
        Self {
            display_name: value.name,
            email: value.email,
            mobile: value.mobile,
            department: value.department,
        }
    }
}

/// Query of the profile completion route.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompleteProfileQuery {
    pub filename: Option<String>,
    pub mobile: Option<String>,
    pub department: Option<String>,
}

/// Completed profile and the stored proof document.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteProfileResponse {
    pub profile: UserProfileResponse,
    pub id_proof_url: String,
}

/// Reply to a proof document upload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ProofUploadResponse {
    /// Always `success`.
    pub status: String,
    pub url: String,
}

/// Register a member profile for the signed-in subject.
#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Member registered", body = UserProfileResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Already registered", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "registerUser",
    security(("BearerToken" = []))
)]
#[post("/users/register")]
pub async fn register_user(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<RegisterUserRequest>,
) -> ApiResult<HttpResponse> {
    let claim = caller.require_claim()?;
    let profile = state
        .registration
        .register_user(claim, payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(UserProfileResponse::from_profile(&profile, &state)))
}

/// Create the caller's member record on first sign-in, or fill gaps in it.
#[utoipa::path(
    post,
    path = "/api/v1/users/sync",
    responses(
        (status = 200, description = "Synchronised profile", body = ProfileResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Email already in use", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "syncProfile",
    security(("BearerToken" = []))
)]
#[post("/users/sync")]
pub async fn sync_profile(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<web::Json<ProfileResponse>> {
    let claim = caller.require_claim()?;
    let record = state.registration.sync_profile(claim).await?;
    Ok(web::Json(ProfileResponse::from_record(&record, &state)))
}

/// Record contact details and a proof document in one step.
#[utoipa::path(
    post,
    path = "/api/v1/users/me/complete",
    params(CompleteProfileQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Profile completed", body = CompleteProfileResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Administrators cannot complete member profiles", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "completeProfile",
    security(("BearerToken" = []))
)]
#[post("/users/me/complete")]
pub async fn complete_profile(
    state: web::Data<HttpState>,
    caller: Caller,
    req: HttpRequest,
    query: web::Query<CompleteProfileQuery>,
    body: web::Bytes,
) -> ApiResult<web::Json<CompleteProfileResponse>> {
    let query = query.into_inner();
    let completion = ProfileCompletion {
        mobile: query.mobile.unwrap_or_default(),
        department: query.department.unwrap_or_default(),
    };
    let upload = ProofUpload {
        file_name: query.filename.unwrap_or_default(),
        content: body.to_vec(),
        content_type: declared_content_type(&req),
    };
    let completed = state
        .registration
        .complete_profile(caller.context(), completion, upload)
        .await?;
    Ok(web::Json(CompleteProfileResponse {
        profile: UserProfileResponse::from_profile(&completed.profile, &state),
        id_proof_url: completed.proof.url,
    }))
}

/// Fetch the caller's own profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Caller profile", body = ProfileResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Profile not synchronised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentProfile",
    security(("BearerToken" = []))
)]
#[get("/users/me")]
pub async fn current_profile(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<web::Json<ProfileResponse>> {
    let ctx = caller.context();
    if !ctx.is_authenticated() {
        return Err(Error::unauthorized("authentication required"));
    }
    if let Some(profile) = ctx.user_profile() {
        return Ok(web::Json(ProfileResponse::User(
            UserProfileResponse::from_profile(profile, &state),
        )));
    }
    ctx.admin_profile()
        .map(|profile| web::Json(ProfileResponse::Admin(profile.into())))
        .ok_or_else(profile_not_synchronised)
}

/// Replace the caller's proof-of-eligibility document.
#[utoipa::path(
    post,
    path = "/api/v1/users/me/id-proof",
    params(UploadQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Proof stored", body = ProofUploadResponse),
        (status = 400, description = "Invalid upload", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Profile not synchronised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "uploadIdProof",
    security(("BearerToken" = []))
)]
#[post("/users/me/id-proof")]
pub async fn upload_id_proof(
    state: web::Data<HttpState>,
    caller: Caller,
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> ApiResult<web::Json<ProofUploadResponse>> {
    let upload = ProofUpload {
        file_name: query.into_inner().file_name(),
        content: body.to_vec(),
        content_type: declared_content_type(&req),
    };
    let receipt = state
        .registration
        .upload_proof(caller.context(), upload)
        .await?;
    Ok(web::Json(ProofUploadResponse {
        status: "success".to_owned(),
        url: receipt.url,
    }))
}

/// List the caller's purchases, most recent first.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/purchases",
    responses(
        (status = 200, description = "Purchase history", body = PurchaseHistoryResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "purchaseHistory",
    security(("BearerToken" = []))
)]
#[get("/users/me/purchases")]
pub async fn purchase_history(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<web::Json<PurchaseHistoryResponse>> {
    let lines = state.purchases.purchase_history(caller.context()).await?;
    Ok(web::Json(PurchaseHistoryResponse::from(lines.as_slice())))
}

/// List every item the caller may read.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/library",
    responses(
        (status = 200, description = "Free and purchased items", body = LibraryResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "library",
    security(("BearerToken" = []))
)]
#[get("/users/me/library")]
pub async fn library(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<web::Json<LibraryResponse>> {
    let entries = state.purchases.library(caller.context()).await?;
    Ok(web::Json(LibraryResponse::from_entries(&entries, &state)))
}
