//! Attendance derivation feeding the two-tier review, on in-memory values.

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime, Utc};

use officeflow::engine::policy::PolicySnapshot;
use officeflow::engine::status::derive_status;
use officeflow::engine::workflow::{self, ReviewDecision, ReviewTier, open_request};
use officeflow::error::AttendanceError;
use officeflow::model::approval_level::ApprovalLevel;
use officeflow::model::approval_request::{ApprovalRequest, ApprovalStatus};
use officeflow::model::attendance::{AttendanceRecord, DayStatus};
use officeflow::model::employee::{Actor, EmployeeStatus};

const UNIT: u64 = 4;
const EMPLOYEE: u64 = 7;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

/// A late clock-in on a working day, as the engine would store it.
fn late_day() -> AttendanceRecord {
    let clock_in = NaiveTime::from_hms_opt(9, 20, 0);
    let derived = derive_status(
        EmployeeStatus::Active,
        monday(),
        clock_in,
        None,
        &PolicySnapshot::default(),
    );
    AttendanceRecord {
        id: 42,
        employee_id: EMPLOYEE,
        date: monday(),
        clock_in_time: clock_in,
        clock_out_time: None,
        day_status: derived.status,
        hours_worked: derived.hours_worked,
        has_pending_approval_request: false,
        is_manual_entry: false,
        marked_by: None,
        manual_entry_reason: None,
        remarks: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn employee() -> Actor {
    Actor {
        user_id: 107,
        employee_id: Some(EMPLOYEE),
        unit_id: Some(UNIT),
        ..Actor::default()
    }
}

fn supervisor() -> Actor {
    Actor {
        user_id: 112,
        employee_id: Some(12),
        approval_level: ApprovalLevel::Supervisor,
        unit_id: Some(UNIT),
        supervised_unit_id: Some(UNIT),
        ..Actor::default()
    }
}

fn hr() -> Actor {
    Actor {
        user_id: 103,
        employee_id: Some(3),
        approval_level: ApprovalLevel::HrAdmin,
        ..Actor::default()
    }
}

/// Opens a request the way the service does: validate, then take the flag.
fn open(record: &mut AttendanceRecord) -> ApprovalRequest {
    let new = open_request(record, EMPLOYEE, "Bus broke down", None).unwrap();
    record.has_pending_approval_request = true;
    ApprovalRequest::from_new(1, new, Utc::now())
}

fn step(
    request: &mut ApprovalRequest,
    record: &mut AttendanceRecord,
    actor: &Actor,
    tier: ReviewTier,
    decision: ReviewDecision,
    notes: Option<&str>,
) -> Result<workflow::Transition, AttendanceError> {
    workflow::review(
        request,
        record,
        actor,
        Some(UNIT),
        tier,
        decision,
        notes,
        Utc::now(),
    )
}

#[test]
fn late_clock_in_is_contestable() {
    let record = late_day();
    assert_eq!(record.day_status, DayStatus::Absent);
    assert!(record.can_request_approval());
}

#[test]
fn full_chain_marks_the_day_present() {
    let mut record = late_day();
    let mut request = open(&mut record);
    assert!(record.has_pending_approval_request);

    step(
        &mut request,
        &mut record,
        &supervisor(),
        ReviewTier::Supervisor,
        ReviewDecision::Approve,
        Some("Saw the bus report"),
    )
    .unwrap();
    assert_eq!(request.status, ApprovalStatus::SupervisorApproved);
    assert_eq!(request.supervisor_reviewed_by, Some(112));
    assert_eq!(request.supervisor_review_notes.as_deref(), Some("Saw the bus report"));
    assert_eq!(record.day_status, DayStatus::Absent);
    assert!(record.has_pending_approval_request);

    step(
        &mut request,
        &mut record,
        &hr(),
        ReviewTier::Hr,
        ReviewDecision::Approve,
        None,
    )
    .unwrap();
    assert_eq!(request.status, ApprovalStatus::HrApproved);
    assert_eq!(request.hr_reviewed_by, Some(103));
    assert!(request.hr_reviewed_at.is_some());
    assert_eq!(record.day_status, DayStatus::Present);
    assert!(!record.has_pending_approval_request);
}

#[test]
fn hr_cannot_approve_after_rejection() {
    let mut record = late_day();
    let mut request = open(&mut record);

    step(
        &mut request,
        &mut record,
        &supervisor(),
        ReviewTier::Supervisor,
        ReviewDecision::Reject,
        Some("No evidence"),
    )
    .unwrap();
    assert_eq!(request.status, ApprovalStatus::Rejected);
    assert!(!record.has_pending_approval_request);

    let before = (request.clone(), record.clone());
    let result = step(
        &mut request,
        &mut record,
        &hr(),
        ReviewTier::Hr,
        ReviewDecision::Approve,
        None,
    );
    assert_matches!(
        result,
        Err(AttendanceError::InvalidTransition {
            from: ApprovalStatus::Rejected,
            to: ApprovalStatus::HrApproved
        })
    );
    assert_eq!(record.day_status, DayStatus::Absent);
    assert_eq!((request, record), before);
}

#[test]
fn hr_cannot_skip_the_supervisor() {
    let mut record = late_day();
    let mut request = open(&mut record);

    let result = step(
        &mut request,
        &mut record,
        &hr(),
        ReviewTier::Hr,
        ReviewDecision::Approve,
        None,
    );
    assert_matches!(result, Err(e) if e.is_precondition());
    assert_eq!(request.status, ApprovalStatus::Pending);
}

#[test]
fn outsiders_cannot_review_at_the_supervisor_tier() {
    let mut record = late_day();
    let mut request = open(&mut record);
    let before = (request.clone(), record.clone());

    let other_unit_supervisor = Actor {
        supervised_unit_id: Some(UNIT + 1),
        ..supervisor()
    };
    for actor in [employee(), hr(), other_unit_supervisor] {
        let result = step(
            &mut request,
            &mut record,
            &actor,
            ReviewTier::Supervisor,
            ReviewDecision::Approve,
            None,
        );
        assert_matches!(result, Err(AttendanceError::Unauthorized(_)));
        assert_eq!((request.clone(), record.clone()), before);
    }
}

#[test]
fn rejection_without_notes_changes_nothing() {
    let mut record = late_day();
    let mut request = open(&mut record);

    let result = step(
        &mut request,
        &mut record,
        &supervisor(),
        ReviewTier::Supervisor,
        ReviewDecision::Reject,
        Some("  "),
    );
    assert_matches!(result, Err(AttendanceError::Validation(_)));
    assert_eq!(request.status, ApprovalStatus::Pending);
    assert!(record.has_pending_approval_request);
}

#[test]
fn superuser_can_walk_both_tiers() {
    let root = Actor {
        user_id: 1,
        is_superuser: true,
        ..Actor::default()
    };
    let mut record = late_day();
    let mut request = open(&mut record);

    for tier in [ReviewTier::Supervisor, ReviewTier::Hr] {
        step(&mut request, &mut record, &root, tier, ReviewDecision::Approve, None).unwrap();
    }
    assert_eq!(request.status, ApprovalStatus::HrApproved);
    assert_eq!(record.day_status, DayStatus::Present);
}

#[test]
fn request_creation_preconditions() {
    // Not absent.
    let mut present = late_day();
    present.day_status = DayStatus::Present;
    assert_matches!(
        open_request(&present, EMPLOYEE, "reason", None),
        Err(AttendanceError::Precondition(_))
    );

    // Already pending.
    let mut record = late_day();
    let _ = open(&mut record);
    assert_matches!(
        open_request(&record, EMPLOYEE, "again", None),
        Err(AttendanceError::Precondition(_))
    );

    // Someone else's day.
    assert_matches!(
        open_request(&late_day(), EMPLOYEE + 1, "reason", None),
        Err(AttendanceError::Unauthorized(_))
    );

    // Blank reason.
    assert_matches!(
        open_request(&late_day(), EMPLOYEE, "   ", None),
        Err(AttendanceError::Validation(_))
    );
}

#[test]
fn a_rejected_day_can_be_contested_again() {
    let mut record = late_day();
    let mut request = open(&mut record);
    step(
        &mut request,
        &mut record,
        &supervisor(),
        ReviewTier::Supervisor,
        ReviewDecision::Reject,
        Some("Ask HR directly"),
    )
    .unwrap();

    assert!(open_request(&record, EMPLOYEE, "With the bus company letter", None).is_ok());
}
