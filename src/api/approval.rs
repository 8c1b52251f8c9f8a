use crate::auth::auth::AuthUser;
use crate::engine::workflow::{ReviewCapabilities, ReviewDecision, ReviewTier};
use crate::error::AttendanceError;
use crate::model::approval_request::{ApprovalRequest, ApprovalStatus, ApprovalStatusCounts};
use crate::repo::approval::ListFilter;
use crate::service;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

#[derive(Deserialize, ToSchema)]
pub struct CreateApprovalReq {
    /// The ABSENT attendance record being contested
    #[schema(example = 42)]
    pub attendance_id: u64,
    #[schema(example = "Badge reader was down at the east entrance")]
    pub reason: String,
    #[schema(example = "uploads/approvals/42-badge-log.pdf")]
    pub supporting_document: Option<String>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct ReviewReq {
    /// Required when rejecting
    #[schema(example = "Confirmed with facilities")]
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ApprovalFilter {
    /// Filter by request status
    #[schema(example = "PENDING")]
    pub status: Option<ApprovalStatus>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u32>,
    /// Items per page, at most 100
    #[schema(example = 20)]
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct ApprovalListResponse {
    pub data: Vec<ApprovalRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

impl ApprovalFilter {
    fn to_list_filter(&self) -> ListFilter {
        ListFilter {
            status: self.status,
            page: self.page.unwrap_or(1).max(1),
            per_page: self
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }
}

/// Contest an ABSENT day
#[utoipa::path(
    post,
    path = "/api/approvals",
    request_body = CreateApprovalReq,
    responses(
        (status = 201, description = "Request opened, waiting for the unit supervisor", body = ApprovalRequest),
        (status = 400, description = "Missing reason"),
        (status = 403, description = "Not the caller's own attendance"),
        (status = 404, description = "Attendance record not found"),
        (status = 409, description = "Day is not ABSENT or already has a pending request")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
#[instrument(name = "approval_create", skip(auth, pool, payload), fields(user_id = auth.user_id, attendance_id = payload.attendance_id))]
pub async fn create_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateApprovalReq>,
) -> Result<HttpResponse, AttendanceError> {
    let actor = service::load_actor(&pool, auth.user_id).await?;
    let payload = payload.into_inner();

    let request = service::approval::request_approval(
        &pool,
        &actor,
        payload.attendance_id,
        &payload.reason,
        payload.supporting_document,
        Utc::now(),
    )
    .await?;
    Ok(HttpResponse::Created().json(request))
}

/// List the requests visible to the caller
#[utoipa::path(
    get,
    path = "/api/approvals",
    params(ApprovalFilter),
    responses(
        (status = 200, description = "HR sees all, supervisors their unit's pending queue, employees their own", body = ApprovalListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
pub async fn list_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ApprovalFilter>,
) -> Result<HttpResponse, AttendanceError> {
    let actor = service::load_actor(&pool, auth.user_id).await?;
    let filter = query.to_list_filter();

    let (data, total) = service::approval::list_visible(&pool, &actor, filter).await?;
    Ok(HttpResponse::Ok().json(ApprovalListResponse {
        data,
        page: filter.page,
        per_page: filter.per_page,
        total,
    }))
}

/// Request counts per status over the caller's visible set
#[utoipa::path(
    get,
    path = "/api/approvals/summary",
    responses(
        (status = 200, description = "Counts per status", body = ApprovalStatusCounts)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AttendanceError> {
    let actor = service::load_actor(&pool, auth.user_id).await?;
    let counts = service::approval::summary(&pool, &actor).await?;
    Ok(HttpResponse::Ok().json(counts))
}

/// Fetch one request
#[utoipa::path(
    get,
    path = "/api/approvals/{id}",
    params(
        ("id" = u64, Path, description = "Approval request id")
    ),
    responses(
        (status = 200, description = "The request", body = ApprovalRequest),
        (status = 404, description = "Not found or not visible to the caller")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
pub async fn get_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AttendanceError> {
    let actor = service::load_actor(&pool, auth.user_id).await?;
    let (request, _) = service::approval::get(&pool, &actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// What the caller may do with a request
#[utoipa::path(
    get,
    path = "/api/approvals/{id}/capabilities",
    params(
        ("id" = u64, Path, description = "Approval request id")
    ),
    responses(
        (status = 200, description = "Review capabilities", body = ReviewCapabilities),
        (status = 404, description = "Not found or not visible to the caller")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
pub async fn capabilities(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AttendanceError> {
    let actor = service::load_actor(&pool, auth.user_id).await?;
    let caps = service::approval::capabilities(&pool, &actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(caps))
}

async fn review(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    request_id: u64,
    tier: ReviewTier,
    decision: ReviewDecision,
    body: Option<web::Json<ReviewReq>>,
) -> Result<HttpResponse, AttendanceError> {
    let actor = service::load_actor(&pool, auth.user_id).await?;
    let notes = body.and_then(|b| b.into_inner().notes);

    let request = service::approval::review(
        &pool,
        &actor,
        request_id,
        tier,
        decision,
        notes.as_deref(),
        Utc::now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Supervisor approval (PENDING → SUPERVISOR_APPROVED)
#[utoipa::path(
    put,
    path = "/api/approvals/{id}/supervisor/approve",
    params(
        ("id" = u64, Path, description = "Approval request id")
    ),
    request_body(content = ReviewReq, description = "Optional review notes"),
    responses(
        (status = 200, description = "Forwarded to HR", body = ApprovalRequest),
        (status = 403, description = "Not the employee's unit supervisor"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not PENDING")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
#[instrument(name = "supervisor_approve", skip(auth, pool, body), fields(user_id = auth.user_id))]
pub async fn supervisor_approve(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: Option<web::Json<ReviewReq>>,
) -> Result<HttpResponse, AttendanceError> {
    let id = path.into_inner();
    review(auth, pool, id, ReviewTier::Supervisor, ReviewDecision::Approve, body).await
}

/// Supervisor rejection (PENDING → REJECTED); notes required
#[utoipa::path(
    put,
    path = "/api/approvals/{id}/supervisor/reject",
    params(
        ("id" = u64, Path, description = "Approval request id")
    ),
    request_body = ReviewReq,
    responses(
        (status = 200, description = "Rejected; the day stays ABSENT", body = ApprovalRequest),
        (status = 400, description = "Notes missing"),
        (status = 403, description = "Not the employee's unit supervisor"),
        (status = 409, description = "Request is not PENDING")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
#[instrument(name = "supervisor_reject", skip(auth, pool, body), fields(user_id = auth.user_id))]
pub async fn supervisor_reject(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: Option<web::Json<ReviewReq>>,
) -> Result<HttpResponse, AttendanceError> {
    let id = path.into_inner();
    review(auth, pool, id, ReviewTier::Supervisor, ReviewDecision::Reject, body).await
}

/// HR approval (SUPERVISOR_APPROVED → HR_APPROVED); the day becomes PRESENT
#[utoipa::path(
    put,
    path = "/api/approvals/{id}/hr/approve",
    params(
        ("id" = u64, Path, description = "Approval request id")
    ),
    request_body(content = ReviewReq, description = "Optional review notes"),
    responses(
        (status = 200, description = "Approved; attendance overridden to PRESENT", body = ApprovalRequest),
        (status = 403, description = "HR only"),
        (status = 409, description = "Request is not SUPERVISOR_APPROVED")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
#[instrument(name = "hr_approve", skip(auth, pool, body), fields(user_id = auth.user_id))]
pub async fn hr_approve(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: Option<web::Json<ReviewReq>>,
) -> Result<HttpResponse, AttendanceError> {
    let id = path.into_inner();
    review(auth, pool, id, ReviewTier::Hr, ReviewDecision::Approve, body).await
}

/// HR rejection (SUPERVISOR_APPROVED → REJECTED); notes required
#[utoipa::path(
    put,
    path = "/api/approvals/{id}/hr/reject",
    params(
        ("id" = u64, Path, description = "Approval request id")
    ),
    request_body = ReviewReq,
    responses(
        (status = 200, description = "Rejected; the day stays ABSENT", body = ApprovalRequest),
        (status = 400, description = "Notes missing"),
        (status = 403, description = "HR only"),
        (status = 409, description = "Request is not SUPERVISOR_APPROVED")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
#[instrument(name = "hr_reject", skip(auth, pool, body), fields(user_id = auth.user_id))]
pub async fn hr_reject(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: Option<web::Json<ReviewReq>>,
) -> Result<HttpResponse, AttendanceError> {
    let id = path.into_inner();
    review(auth, pool, id, ReviewTier::Hr, ReviewDecision::Reject, body).await
}
