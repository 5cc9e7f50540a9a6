//! Administrator API handlers.
//!
//! ```text
//! POST  /api/v1/admin/register               Register an administrator profile
//! GET   /api/v1/admin/users                  List members
//! GET   /api/v1/admin/users/{uid}            Member details and purchases
//! PATCH /api/v1/admin/users/{uid}            Edit a member's details
//! POST  /api/v1/admin/users/{uid}/suspend    Suspend or reactivate a member
//! POST  /api/v1/admin/users/{uid}/verify-id  Review a member's proof document
//! POST  /api/v1/admin/password-reset         Issue a password reset link
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AdminRegistration, Department, Error, MemberEdit, MemberFilter, ProofFilter, ProofReview,
    Role, SubjectId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{
    AccountUpdateResponse, AdminProfileResponse, MemberDetailsResponse, UserProfileResponse,
};
use crate::inbound::http::identity::Caller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Administrator registration request body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAdminRequest {
    pub name: String,
    pub email: String,
    /// Elevation credential, recorded for audit only.
    #[serde(default)]
    pub elevation_key: Option<String>,
}

/// Suspension toggle.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SuspensionRequest {
    pub suspended: bool,
}

/// Proof review outcome.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ProofReviewRequest {
    pub verified: bool,
    /// Shown to the member when the proof is rejected.
    #[serde(default)]
    pub reason: Option<String>,
}

impl From<ProofReviewRequest> for ProofReview {
    fn from(value: ProofReviewRequest) -> Self {
        if value.verified {
            Self::Verified
        } else {
            Self::Rejected {
                reason: value.reason.unwrap_or_default(),
            }
        }
    }
}

/// Review outcome together with the updated member record.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ProofReviewResponse {
    pub success: bool,
    pub message: String,
    pub profile: UserProfileResponse,
}

/// Password reset request body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Password reset link minted by the identity service.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PasswordResetResponse {
    pub link: String,
}

/// Member listing filters. Blank values and `all` are ignored.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MemberListQuery {
    /// `student`, `faculty` or `alumni`.
    pub role: Option<String>,
    pub department: Option<String>,
    pub semester: Option<String>,
    /// Matched against name, email and member identifier, ignoring case.
    pub search: Option<String>,
    /// `verified`, `pending`, `rejected` or `not_uploaded`.
    pub id_proof_status: Option<String>,
}

fn selected(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty() && !raw.eq_ignore_ascii_case("all"))
}

fn parsed<T>(value: Option<String>) -> Result<Option<T>, Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    selected(value)
        .map(|raw| raw.to_ascii_lowercase().parse::<T>())
        .transpose()
        .map_err(|err| Error::invalid_request(err.to_string()).with_reason("invalid_filter"))
}

impl TryFrom<MemberListQuery> for MemberFilter {
    type Error = Error;

    fn try_from(value: MemberListQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            role: parsed::<Role>(value.role)?,
            department: selected(value.department).map(Department::new).transpose()?,
            semester: selected(value.semester),
            search: selected(value.search),
            proof: parsed::<ProofFilter>(value.id_proof_status)?,
        })
    }
}

/// Member listing.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct MemberListResponse {
    pub users: Vec<UserProfileResponse>,
    pub total: usize,
}

/// Fields an administrator may change on a member record.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UpdateMemberRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
    /// `student`, `faculty` or `alumni`.
    #[serde(default)]
    pub role: Option<String>,
}

impl TryFrom<UpdateMemberRequest> for MemberEdit {
    type Error = Error;

    fn try_from(value: UpdateMemberRequest) -> Result<Self, Self::Error> {
        let role = value
            .role
            .map(|raw| raw.parse::<Role>())
            .transpose()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        Ok(Self {
            display_name: value.name,
            mobile: value.mobile,
            department: value.department.map(Department::new).transpose()?,
            semester: value.semester,
            role,
        })
    }
}

fn member_subject(raw: String) -> Result<SubjectId, Error> {
    SubjectId::new(raw).map_err(|_| Error::not_found("user not found"))
}

/// Register an administrator profile for the signed-in subject.
#[utoipa::path(
    post,
    path = "/api/v1/admin/register",
    request_body = RegisterAdminRequest,
    responses(
        (status = 201, description = "Administrator registered", body = AdminProfileResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Already registered", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "registerAdmin",
    security(("BearerToken" = []))
)]
#[post("/admin/register")]
pub async fn register_admin(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<RegisterAdminRequest>,
) -> ApiResult<HttpResponse> {
    let claim = caller.require_claim()?;
    let RegisterAdminRequest {
        name,
        email,
        elevation_key,
    } = payload.into_inner();
    let profile = state
        .registration
        .register_admin(
            claim,
            AdminRegistration {
                display_name: name,
                email,
                elevation_key,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(AdminProfileResponse::from(&profile)))
}

/// List members, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    params(MemberListQuery),
    responses(
        (status = 200, description = "Matching members", body = MemberListResponse),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "listMembers",
    security(("BearerToken" = []))
)]
#[get("/admin/users")]
pub async fn list_members(
    state: web::Data<HttpState>,
    caller: Caller,
    query: web::Query<MemberListQuery>,
) -> ApiResult<web::Json<MemberListResponse>> {
    let filter = MemberFilter::try_from(query.into_inner())?;
    let members = state
        .accounts
        .list_members(caller.context(), &filter)
        .await?;
    let users: Vec<UserProfileResponse> = members
        .iter()
        .map(|profile| UserProfileResponse::from_profile(profile, &state))
        .collect();
    Ok(web::Json(MemberListResponse {
        total: users.len(),
        users,
    }))
}

/// Member record and purchase history, by subject or member identifier.
#[utoipa::path(
    get,
    path = "/api/v1/admin/users/{uid}",
    params(("uid" = String, Path, description = "Subject or member identifier")),
    responses(
        (status = 200, description = "Member details", body = MemberDetailsResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown member", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "memberDetails",
    security(("BearerToken" = []))
)]
#[get("/admin/users/{uid}")]
pub async fn member_details(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
) -> ApiResult<web::Json<MemberDetailsResponse>> {
    let details = state
        .accounts
        .member_details(caller.context(), &path)
        .await?;
    Ok(web::Json(MemberDetailsResponse::from_details(&details, &state)))
}

/// Change a member's name, contact details, department, semester or role.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/users/{uid}",
    params(("uid" = String, Path, description = "Member subject identifier")),
    request_body = UpdateMemberRequest,
    responses(
        (status = 200, description = "Member updated", body = UserProfileResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown member", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "updateMember",
    security(("BearerToken" = []))
)]
#[patch("/admin/users/{uid}")]
pub async fn update_member(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
    payload: web::Json<UpdateMemberRequest>,
) -> ApiResult<web::Json<UserProfileResponse>> {
    let subject = member_subject(path.into_inner())?;
    let edit = MemberEdit::try_from(payload.into_inner())?;
    let profile = state
        .accounts
        .update_member(caller.context(), &subject, edit)
        .await?;
    Ok(web::Json(UserProfileResponse::from_profile(&profile, &state)))
}

/// Suspend or reactivate a member account.
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{uid}/suspend",
    params(("uid" = String, Path, description = "Member subject identifier")),
    request_body = SuspensionRequest,
    responses(
        (status = 200, description = "Suspension updated", body = AccountUpdateResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown member", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "setSuspension",
    security(("BearerToken" = []))
)]
#[post("/admin/users/{uid}/suspend")]
pub async fn set_suspension(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
    payload: web::Json<SuspensionRequest>,
) -> ApiResult<web::Json<AccountUpdateResponse>> {
    let subject = member_subject(path.into_inner())?;
    let update = state
        .accounts
        .set_suspension(caller.context(), &subject, payload.suspended)
        .await?;
    Ok(web::Json(update.into()))
}

/// Mark a member's proof document verified or rejected.
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{uid}/verify-id",
    params(("uid" = String, Path, description = "Member subject identifier")),
    request_body = ProofReviewRequest,
    responses(
        (status = 200, description = "Review recorded", body = ProofReviewResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown member", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "reviewProof",
    security(("BearerToken" = []))
)]
#[post("/admin/users/{uid}/verify-id")]
pub async fn review_proof(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<String>,
    payload: web::Json<ProofReviewRequest>,
) -> ApiResult<web::Json<ProofReviewResponse>> {
    let subject = member_subject(path.into_inner())?;
    let (profile, update) = state
        .accounts
        .review_proof(caller.context(), &subject, payload.into_inner().into())
        .await?;
    Ok(web::Json(ProofReviewResponse {
        success: update.success,
        message: update.message,
        profile: UserProfileResponse::from_profile(&profile, &state),
    }))
}

/// Ask the identity service for a password reset link.
#[utoipa::path(
    post,
    path = "/api/v1/admin/password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset link", body = PasswordResetResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown account", body = ErrorSchema),
        (status = 503, description = "Identity service unavailable", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "issuePasswordReset",
    security(("BearerToken" = []))
)]
#[post("/admin/password-reset")]
pub async fn password_reset(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<PasswordResetRequest>,
) -> ApiResult<web::Json<PasswordResetResponse>> {
    let link = state
        .accounts
        .issue_password_reset(caller.context(), &payload.email)
        .await?;
    Ok(web::Json(PasswordResetResponse { link }))
}
