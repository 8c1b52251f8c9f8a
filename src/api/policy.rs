use crate::auth::auth::AuthUser;
use crate::error::AttendanceError;
use crate::model::time_policy::{NewTimePolicy, TimePolicy};
use crate::service;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HolidayView {
    #[schema(example = "New Year's Day")]
    pub name: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct PolicyResponse {
    /// `id` 0 means no policy is active and built-in defaults apply
    pub policy: TimePolicy,
    pub holidays: Vec<HolidayView>,
}

/// The governing time policy and the active holiday calendar
#[utoipa::path(
    get,
    path = "/api/policy",
    responses(
        (status = 200, description = "Active policy (or defaults) and holidays", body = PolicyResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Policy"
)]
pub async fn current_policy(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AttendanceError> {
    let (policy, holidays) = service::policy::current(&pool).await?;

    Ok(HttpResponse::Ok().json(PolicyResponse {
        policy,
        holidays: holidays
            .into_iter()
            .map(|h| HolidayView {
                name: h.name,
                date: h.date,
            })
            .collect(),
    }))
}

/// Create a time policy (HR only)
#[utoipa::path(
    post,
    path = "/api/policy",
    request_body = NewTimePolicy,
    responses(
        (status = 201, description = "Policy stored", body = TimePolicy),
        (status = 400, description = "Inconsistent times or hours"),
        (status = 403, description = "HR only"),
        (status = 409, description = "Another policy is already active")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Policy"
)]
pub async fn create_policy(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<NewTimePolicy>,
) -> Result<HttpResponse, AttendanceError> {
    let actor = service::load_actor(&pool, auth.user_id).await?;
    let policy = service::policy::create(&pool, &actor, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(policy))
}

/// Make a policy the single active one (HR only)
#[utoipa::path(
    put,
    path = "/api/policy/{id}/activate",
    params(
        ("id" = u64, Path, description = "Time policy id")
    ),
    responses(
        (status = 200, description = "Policy activated, previous one deactivated", body = TimePolicy),
        (status = 403, description = "HR only"),
        (status = 404, description = "Policy not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Policy"
)]
pub async fn activate_policy(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AttendanceError> {
    let actor = service::load_actor(&pool, auth.user_id).await?;
    let policy = service::policy::activate(&pool, &actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(policy))
}
