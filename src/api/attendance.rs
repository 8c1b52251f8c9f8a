use crate::auth::auth::AuthUser;
use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, AttendanceSummary};
use crate::service::{self, attendance::ClockTimes};
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct ManualEntryReq {
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "08:45:00", value_type = Option<String>)]
    pub clock_in_time: Option<NaiveTime>,
    #[schema(example = "17:10:00", value_type = Option<String>)]
    pub clock_out_time: Option<NaiveTime>,
    /// Why the day is keyed in by hand
    #[schema(example = "Badge reader offline")]
    pub manual_entry_reason: String,
    pub remarks: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct StatusQuery {
    /// Defaults to the caller's own employee profile
    #[schema(example = 7)]
    pub employee_id: Option<u64>,
    /// Defaults to today
    #[schema(example = "2026-03-02", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct MarkPresentReq {
    #[schema(example = json!([42, 43]))]
    pub attendance_ids: Vec<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct MarkPresentResponse {
    #[schema(example = 2)]
    pub updated: u64,
}

/// Clock in for today
#[utoipa::path(
    post,
    path = "/api/attendance/clock-in",
    responses(
        (status = 200, description = "Clocked in; status derived from the active policy", body = AttendanceRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 409, description = "Already clocked in today"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AttendanceError> {
    let actor = service::load_actor(&pool, auth.user_id).await?;
    let now = Local::now().naive_local();

    let record =
        service::attendance::clock_in(&pool, &actor, now.date(), now.time(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Clock out for today
#[utoipa::path(
    post,
    path = "/api/attendance/clock-out",
    responses(
        (status = 200, description = "Clocked out; hours worked recorded", body = AttendanceRecord),
        (status = 400, description = "Clock-out not after clock-in"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "No active clock-in, or the clock-out deadline has passed"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AttendanceError> {
    let actor = service::load_actor(&pool, auth.user_id).await?;
    let now = Local::now().naive_local();

    let record =
        service::attendance::clock_out(&pool, &actor, now.date(), now.time(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Record a day on behalf of an employee (unit supervisor or HR)
#[utoipa::path(
    put,
    path = "/api/attendance/manual",
    request_body = ManualEntryReq,
    responses(
        (status = 200, description = "Day recorded", body = AttendanceRecord),
        (status = 400, description = "Invalid times or missing reason"),
        (status = 403, description = "Not the employee's supervisor or HR"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn manual_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ManualEntryReq>,
) -> Result<HttpResponse, AttendanceError> {
    let actor = service::load_actor(&pool, auth.user_id).await?;
    let payload = payload.into_inner();

    let record = service::attendance::manual_entry(
        &pool,
        &actor,
        payload.employee_id,
        payload.date,
        ClockTimes {
            clock_in: payload.clock_in_time,
            clock_out: payload.clock_out_time,
        },
        &payload.manual_entry_reason,
        payload.remarks,
        Utc::now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Attendance status of one employee-day
#[utoipa::path(
    get,
    path = "/api/attendance/status",
    params(StatusQuery),
    responses(
        (status = 200, description = "Stored record with late/full-day/early-departure flags", body = AttendanceSummary),
        (status = 403, description = "Not allowed to view this employee"),
        (status = 404, description = "No record for that day")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, AttendanceError> {
    let actor = service::load_actor(&pool, auth.user_id).await?;

    let employee_id = query
        .employee_id
        .or(actor.employee_id)
        .ok_or_else(|| AttendanceError::Validation("employee_id is required".into()))?;
    let date = query.date.unwrap_or_else(|| Local::now().date_naive());

    let summary = service::attendance::status_for(&pool, &actor, employee_id, date).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Force selected records to PRESENT (HR only)
#[utoipa::path(
    post,
    path = "/api/attendance/mark-present",
    request_body = MarkPresentReq,
    responses(
        (status = 200, description = "Records overridden", body = MarkPresentResponse),
        (status = 400, description = "Empty selection"),
        (status = 403, description = "HR only"),
        (status = 409, description = "A selected day has a pending approval request")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_present(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<MarkPresentReq>,
) -> Result<HttpResponse, AttendanceError> {
    let actor = service::load_actor(&pool, auth.user_id).await?;

    let updated =
        service::attendance::mark_present(&pool, &actor, &payload.attendance_ids, Utc::now())
            .await?;
    Ok(HttpResponse::Ok().json(MarkPresentResponse { updated }))
}
