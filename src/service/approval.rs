use chrono::{DateTime, Utc};
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{info, warn};

use crate::engine::visibility::{can_view, scope_for};
use crate::engine::workflow::{
    self, ReviewCapabilities, ReviewDecision, ReviewTier, normalize_notes, open_request,
};
use crate::error::{AttendanceError, AttendanceResult};
use crate::model::approval_request::{ApprovalRequest, ApprovalStatusCounts};
use crate::model::employee::Actor;
use crate::repo::approval::{ApprovalRepo, ListFilter};
use crate::repo::attendance::AttendanceRepo;
use crate::repo::employee::EmployeeRepo;

async fn unit_of(conn: &mut MySqlConnection, employee_id: u64) -> AttendanceResult<Option<u64>> {
    Ok(EmployeeRepo::find(conn, employee_id)
        .await?
        .ok_or_else(|| AttendanceError::not_found("employee", employee_id))?
        .unit_id)
}

/// Opens a request against one of the actor's own ABSENT days.
pub async fn request_approval(
    pool: &MySqlPool,
    actor: &Actor,
    attendance_id: u64,
    reason: &str,
    supporting_document: Option<String>,
    now: DateTime<Utc>,
) -> AttendanceResult<ApprovalRequest> {
    let employee_id = actor
        .employee_id
        .ok_or_else(|| AttendanceError::Unauthorized("No employee profile".into()))?;

    let mut tx = pool.begin().await?;

    let record = AttendanceRepo::find_by_id_for_update(&mut tx, attendance_id)
        .await?
        .ok_or_else(|| AttendanceError::not_found("attendance", attendance_id))?;
    let new = open_request(&record, employee_id, reason, supporting_document)?;

    if !AttendanceRepo::reserve_for_approval(&mut tx, attendance_id, now).await? {
        return Err(AttendanceError::Precondition(
            "An approval request is already pending for this day".into(),
        ));
    }
    let id = ApprovalRepo::insert(&mut tx, &new, now).await?;

    tx.commit().await?;

    info!(request_id = id, attendance_id, employee_id, "Approval request opened");
    Ok(ApprovalRequest::from_new(id, new, now))
}

/// One review step at `tier`. Locks the attendance row before the request
/// row; every path that touches both takes them in that order.
pub async fn review(
    pool: &MySqlPool,
    actor: &Actor,
    request_id: u64,
    tier: ReviewTier,
    decision: ReviewDecision,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> AttendanceResult<ApprovalRequest> {
    let mut tx = pool.begin().await?;

    let attendance_id = ApprovalRepo::attendance_id_of(&mut tx, request_id)
        .await?
        .ok_or_else(|| AttendanceError::not_found("approval request", request_id))?;
    let mut record = AttendanceRepo::find_by_id_for_update(&mut tx, attendance_id)
        .await?
        .ok_or_else(|| AttendanceError::not_found("attendance", attendance_id))?;
    let mut request = ApprovalRepo::find_by_id_for_update(&mut tx, request_id)
        .await?
        .ok_or_else(|| AttendanceError::not_found("approval request", request_id))?;
    let unit_id = unit_of(&mut tx, request.employee_id).await?;

    let transition = workflow::review(
        &mut request,
        &mut record,
        actor,
        unit_id,
        tier,
        decision,
        notes,
        now,
    )?;

    let notes = normalize_notes(notes);
    let moved = ApprovalRepo::apply_transition(
        &mut tx,
        request_id,
        &transition,
        actor.user_id,
        notes.as_deref(),
        now,
    )
    .await?;
    if !moved {
        warn!(request_id, from = %transition.from, "Approval request moved concurrently");
        return Err(AttendanceError::InvalidTransition {
            from: transition.from,
            to: transition.to,
        });
    }
    if transition.releases_record() {
        AttendanceRepo::settle_approval(&mut tx, attendance_id, transition.marks_present(), now)
            .await?;
    }

    tx.commit().await?;

    info!(
        request_id,
        attendance_id,
        reviewer = actor.user_id,
        from = %transition.from,
        to = %transition.to,
        day_status = %record.day_status,
        "Approval request reviewed"
    );
    Ok(request)
}

/// A page of the requests the actor may see, newest first.
pub async fn list_visible(
    pool: &MySqlPool,
    actor: &Actor,
    filter: ListFilter,
) -> AttendanceResult<(Vec<ApprovalRequest>, i64)> {
    let mut conn = pool.acquire().await?;
    Ok(ApprovalRepo::list(&mut conn, scope_for(actor), filter).await?)
}

pub async fn summary(pool: &MySqlPool, actor: &Actor) -> AttendanceResult<ApprovalStatusCounts> {
    let mut conn = pool.acquire().await?;
    Ok(ApprovalRepo::count_by_status(&mut conn, scope_for(actor)).await?)
}

/// Fetches a request the actor may view. Invisible requests read as
/// missing.
pub async fn get(
    pool: &MySqlPool,
    actor: &Actor,
    request_id: u64,
) -> AttendanceResult<(ApprovalRequest, Option<u64>)> {
    let mut conn = pool.acquire().await?;
    let request = ApprovalRepo::find_by_id(&mut conn, request_id)
        .await?
        .ok_or_else(|| AttendanceError::not_found("approval request", request_id))?;
    let unit_id = unit_of(&mut conn, request.employee_id).await?;

    if !can_view(actor, &request, unit_id) {
        return Err(AttendanceError::not_found("approval request", request_id));
    }
    Ok((request, unit_id))
}

pub async fn capabilities(
    pool: &MySqlPool,
    actor: &Actor,
    request_id: u64,
) -> AttendanceResult<ReviewCapabilities> {
    let (request, unit_id) = get(pool, actor, request_id).await?;
    Ok(workflow::capabilities(actor, unit_id, request.status))
}
