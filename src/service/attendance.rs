use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use sqlx::MySqlPool;
use tracing::{debug, info};

use crate::engine::status::{derive_status, validate_clock_times};
use crate::engine::sweep::clock_out_allowed;
use crate::engine::workflow::{can_review_as_hr, can_review_as_supervisor};
use crate::error::{AttendanceError, AttendanceResult};
use crate::model::attendance::{AttendanceRecord, AttendanceSummary};
use crate::model::employee::Actor;
use crate::model::time_policy::TimePolicy;
use crate::repo::attendance::{AttendanceRepo, AttendanceWrite, ManualMark};
use crate::repo::employee::EmployeeRepo;
use crate::repo::policy::PolicyRepo;

/// Clock times for one employee-day. `None` keeps whatever is on file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockTimes {
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
}

/// Stored times have second precision.
fn truncate(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}

/// Check run against the locked row, the incoming times and the policy in
/// force, before a write.
type DayGuard = fn(Option<&AttendanceRecord>, ClockTimes, &TimePolicy) -> AttendanceResult<()>;

fn any_day(_: Option<&AttendanceRecord>, _: ClockTimes, _: &TimePolicy) -> AttendanceResult<()> {
    Ok(())
}

fn not_clocked_in(
    existing: Option<&AttendanceRecord>,
    _: ClockTimes,
    _: &TimePolicy,
) -> AttendanceResult<()> {
    if existing.is_some_and(|r| r.clock_in_time.is_some()) {
        return Err(AttendanceError::Precondition(
            "Already clocked in today".into(),
        ));
    }
    Ok(())
}

fn open_clock_in(
    existing: Option<&AttendanceRecord>,
    times: ClockTimes,
    policy: &TimePolicy,
) -> AttendanceResult<()> {
    if !existing.is_some_and(|r| r.clock_in_time.is_some() && r.clock_out_time.is_none()) {
        return Err(AttendanceError::Precondition(
            "No active clock-in found for today".into(),
        ));
    }
    if times
        .clock_out
        .is_some_and(|time| !clock_out_allowed(policy, time))
    {
        return Err(AttendanceError::Precondition(format!(
            "Clock-out deadline {} has passed",
            policy.clock_out_deadline
        )));
    }
    Ok(())
}

/// Creates or updates the record for `(employee_id, date)` and re-derives
/// its status from the merged times.
pub async fn record_attendance(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
    times: ClockTimes,
    manual: Option<ManualMark>,
    now: DateTime<Utc>,
) -> AttendanceResult<AttendanceRecord> {
    write_day(pool, employee_id, date, times, manual, now, any_day).await
}

async fn write_day(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
    times: ClockTimes,
    manual: Option<ManualMark>,
    now: DateTime<Utc>,
    guard: DayGuard,
) -> AttendanceResult<AttendanceRecord> {
    validate_clock_times(times.clock_in, times.clock_out)?;

    let mut tx = pool.begin().await?;

    let employee = EmployeeRepo::find(&mut tx, employee_id)
        .await?
        .ok_or_else(|| AttendanceError::not_found("employee", employee_id))?;

    let existing = AttendanceRepo::find_for_day_for_update(&mut tx, employee_id, date).await?;
    let snapshot = PolicyRepo::snapshot_for(&mut tx, date).await?;
    guard(existing.as_ref(), times, &snapshot.policy)?;

    let clock_in = times
        .clock_in
        .or_else(|| existing.as_ref().and_then(|r| r.clock_in_time));
    let clock_out = times
        .clock_out
        .or_else(|| existing.as_ref().and_then(|r| r.clock_out_time));
    validate_clock_times(clock_in, clock_out)?;

    let derivation = derive_status(employee.employee_status, date, clock_in, clock_out, &snapshot);
    debug!(
        employee_id,
        date = %date,
        policy_id = snapshot.policy.id,
        status = %derivation.status,
        "Attendance derived"
    );

    let write = AttendanceWrite {
        employee_id,
        date,
        clock_in_time: clock_in,
        clock_out_time: clock_out,
        derivation,
        manual,
        now,
    };
    let record = AttendanceRepo::upsert(&mut tx, &write).await?;

    tx.commit().await?;
    Ok(record)
}

/// Self-service clock-in for today.
pub async fn clock_in(
    pool: &MySqlPool,
    actor: &Actor,
    today: NaiveDate,
    time: NaiveTime,
    now: DateTime<Utc>,
) -> AttendanceResult<AttendanceRecord> {
    let employee_id = own_employee_id(actor)?;
    let times = ClockTimes {
        clock_in: Some(truncate(time)),
        clock_out: None,
    };
    let record = write_day(pool, employee_id, today, times, None, now, not_clocked_in).await?;

    info!(employee_id, status = %record.day_status, "Clocked in");
    Ok(record)
}

/// Self-service clock-out for today. Requires an open clock-in.
pub async fn clock_out(
    pool: &MySqlPool,
    actor: &Actor,
    today: NaiveDate,
    time: NaiveTime,
    now: DateTime<Utc>,
) -> AttendanceResult<AttendanceRecord> {
    let employee_id = own_employee_id(actor)?;
    let times = ClockTimes {
        clock_in: None,
        clock_out: Some(truncate(time)),
    };
    let record = write_day(pool, employee_id, today, times, None, now, open_clock_in).await?;

    info!(employee_id, hours_worked = ?record.hours_worked, "Clocked out");
    Ok(record)
}

/// Supervisor or HR keys in a day on behalf of an employee.
#[allow(clippy::too_many_arguments)]
pub async fn manual_entry(
    pool: &MySqlPool,
    actor: &Actor,
    employee_id: u64,
    date: NaiveDate,
    times: ClockTimes,
    reason: &str,
    remarks: Option<String>,
    now: DateTime<Utc>,
) -> AttendanceResult<AttendanceRecord> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AttendanceError::Validation(
            "A reason is required for manual entries".into(),
        ));
    }

    let unit_id = {
        let mut conn = pool.acquire().await?;
        EmployeeRepo::find(&mut conn, employee_id)
            .await?
            .ok_or_else(|| AttendanceError::not_found("employee", employee_id))?
            .unit_id
    };
    if !can_review_as_supervisor(actor, unit_id) && !can_review_as_hr(actor) {
        return Err(AttendanceError::Unauthorized(
            "Only the unit supervisor or HR can record attendance for another employee".into(),
        ));
    }

    let record = record_attendance(
        pool,
        employee_id,
        date,
        times,
        Some(ManualMark {
            marked_by: actor.user_id,
            reason: reason.to_owned(),
            remarks: remarks.map(|r| r.trim().to_owned()).filter(|r| !r.is_empty()),
        }),
        now,
    )
    .await?;

    info!(
        employee_id,
        date = %date,
        marked_by = actor.user_id,
        status = %record.day_status,
        "Manual attendance entry recorded"
    );
    Ok(record)
}

/// Status lookup for one employee-day, with the policy-relative flags.
pub async fn status_for(
    pool: &MySqlPool,
    actor: &Actor,
    employee_id: u64,
    date: NaiveDate,
) -> AttendanceResult<AttendanceSummary> {
    let mut conn = pool.acquire().await?;

    if !actor.is_self(employee_id) && !can_review_as_hr(actor) {
        let unit_id = EmployeeRepo::find(&mut conn, employee_id)
            .await?
            .ok_or_else(|| AttendanceError::not_found("employee", employee_id))?
            .unit_id;
        if !can_review_as_supervisor(actor, unit_id) {
            return Err(AttendanceError::Unauthorized(
                "Not allowed to view this employee's attendance".into(),
            ));
        }
    }

    let record = AttendanceRepo::find_for_day(&mut conn, employee_id, date)
        .await?
        .ok_or(AttendanceError::NoRecord { employee_id, date })?;
    let policy = PolicyRepo::current(&mut conn).await?;

    Ok(AttendanceSummary::new(record, &policy))
}

/// HR override forcing the given records to PRESENT. Refused as a whole
/// while any selected day has a pending approval request, which must be
/// reviewed instead.
pub async fn mark_present(
    pool: &MySqlPool,
    actor: &Actor,
    attendance_ids: &[u64],
    now: DateTime<Utc>,
) -> AttendanceResult<u64> {
    if !can_review_as_hr(actor) {
        return Err(AttendanceError::Unauthorized(
            "Only HR admins can override attendance".into(),
        ));
    }
    if attendance_ids.is_empty() {
        return Err(AttendanceError::Validation(
            "No attendance records selected".into(),
        ));
    }

    let mut tx = pool.begin().await?;
    let locked = AttendanceRepo::find_many_for_update(&mut tx, attendance_ids).await?;
    let pending = pending_ids(&locked);
    if !pending.is_empty() {
        return Err(AttendanceError::Precondition(format!(
            "Attendance records {pending:?} have pending approval requests"
        )));
    }
    let updated =
        AttendanceRepo::mark_present(&mut tx, attendance_ids, actor.user_id, now).await?;
    tx.commit().await?;

    info!(
        marked_by = actor.user_id,
        selected = attendance_ids.len(),
        updated,
        "Attendance marked present by override"
    );
    Ok(updated)
}

fn pending_ids(records: &[AttendanceRecord]) -> Vec<u64> {
    records
        .iter()
        .filter(|r| r.has_pending_approval_request)
        .map(|r| r.id)
        .collect()
}

fn own_employee_id(actor: &Actor) -> AttendanceResult<u64> {
    actor
        .employee_id
        .ok_or_else(|| AttendanceError::Unauthorized("No employee profile".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::DayStatus;
    use assert_matches::assert_matches;

    #[test]
    fn stored_times_drop_sub_seconds() {
        let time = NaiveTime::from_hms_nano_opt(8, 59, 59, 999_000_000).unwrap();
        assert_eq!(truncate(time), NaiveTime::from_hms_opt(8, 59, 59).unwrap());
    }

    fn day(clock_in: Option<NaiveTime>, clock_out: Option<NaiveTime>) -> AttendanceRecord {
        AttendanceRecord {
            id: 42,
            employee_id: 7,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            clock_in_time: clock_in,
            clock_out_time: clock_out,
            day_status: DayStatus::Present,
            hours_worked: None,
            has_pending_approval_request: false,
            is_manual_entry: false,
            marked_by: None,
            manual_entry_reason: None,
            remarks: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn at(hour: u32, minute: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(hour, minute, 0)
    }

    fn leaving(hour: u32, minute: u32) -> ClockTimes {
        ClockTimes {
            clock_in: None,
            clock_out: at(hour, minute),
        }
    }

    #[test]
    fn clock_guards() {
        let policy = TimePolicy::fallback();
        assert!(not_clocked_in(None, ClockTimes::default(), &policy).is_ok());
        assert!(not_clocked_in(Some(&day(at(8, 50), None)), ClockTimes::default(), &policy).is_err());
        assert!(open_clock_in(None, leaving(17, 0), &policy).is_err());
        assert!(open_clock_in(Some(&day(at(8, 50), at(17, 0))), leaving(17, 5), &policy).is_err());
        assert!(open_clock_in(Some(&day(at(8, 50), None)), leaving(17, 0), &policy).is_ok());
    }

    #[test]
    fn clock_out_after_deadline_is_refused_when_enforced() {
        // Swept day: clocked in, never out, already re-marked ABSENT.
        let mut swept = day(at(8, 50), None);
        swept.day_status = DayStatus::Absent;
        let enforcing = TimePolicy {
            auto_mark_absent_after_deadline: true,
            require_clock_out: true,
            ..TimePolicy::fallback()
        };

        assert_matches!(
            open_clock_in(Some(&swept), leaving(19, 0), &enforcing),
            Err(AttendanceError::Precondition(msg)) if msg.contains("deadline")
        );
        assert!(open_clock_in(Some(&swept), leaving(18, 1), &enforcing).is_ok());
        assert!(open_clock_in(Some(&swept), leaving(19, 0), &TimePolicy::fallback()).is_ok());
    }

    #[test]
    fn pending_days_block_the_override() {
        let mut contested = day(None, None);
        contested.id = 43;
        contested.has_pending_approval_request = true;
        assert_eq!(pending_ids(&[day(at(8, 50), None), contested]), vec![43]);
        assert!(pending_ids(&[day(at(8, 50), None)]).is_empty());
    }

    #[test]
    fn accounts_without_profile_cannot_clock() {
        let actor = Actor {
            user_id: 1,
            ..Actor::default()
        };
        assert_matches!(own_employee_id(&actor), Err(AttendanceError::Unauthorized(_)));
        let actor = Actor {
            employee_id: Some(7),
            ..actor
        };
        assert_eq!(own_employee_id(&actor).unwrap(), 7);
    }
}
