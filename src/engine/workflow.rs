//! Two-tier review of absence override requests.
//!
//! ```text
//! PENDING --supervisor approve--> SUPERVISOR_APPROVED --hr approve--> HR_APPROVED
//!    |                                   |
//!    +--supervisor reject--> REJECTED <--+--hr reject
//! ```
//!
//! Everything here is pure: callers plan a transition, persist it, and only
//! then mirror it onto their in-memory values with [`apply`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AttendanceError, AttendanceResult};
use crate::model::approval_request::{ApprovalRequest, ApprovalStatus, NewApprovalRequest};
use crate::model::attendance::{AttendanceRecord, DayStatus};
use crate::model::employee::Actor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewTier {
    Supervisor,
    Hr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// A validated move between two workflow states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub tier: ReviewTier,
    pub decision: ReviewDecision,
    pub from: ApprovalStatus,
    pub to: ApprovalStatus,
}

impl Transition {
    /// Only the final HR approval rewrites the attendance record.
    pub fn marks_present(&self) -> bool {
        self.to == ApprovalStatus::HrApproved
    }

    /// Terminal outcomes free the record for a new request.
    pub fn releases_record(&self) -> bool {
        self.to.is_terminal()
    }
}

/// Source and target state for a tier/decision pair.
pub fn edge(tier: ReviewTier, decision: ReviewDecision) -> (ApprovalStatus, ApprovalStatus) {
    match (tier, decision) {
        (ReviewTier::Supervisor, ReviewDecision::Approve) => {
            (ApprovalStatus::Pending, ApprovalStatus::SupervisorApproved)
        }
        (ReviewTier::Supervisor, ReviewDecision::Reject) => {
            (ApprovalStatus::Pending, ApprovalStatus::Rejected)
        }
        (ReviewTier::Hr, ReviewDecision::Approve) => {
            (ApprovalStatus::SupervisorApproved, ApprovalStatus::HrApproved)
        }
        (ReviewTier::Hr, ReviewDecision::Reject) => {
            (ApprovalStatus::SupervisorApproved, ApprovalStatus::Rejected)
        }
    }
}

/// The actor supervises the unit the requesting employee belongs to.
/// Superusers may act at this tier as well.
pub fn can_review_as_supervisor(actor: &Actor, employee_unit_id: Option<u64>) -> bool {
    actor.is_superuser || actor.supervises(employee_unit_id)
}

pub fn can_review_as_hr(actor: &Actor) -> bool {
    actor.is_superuser || actor.approval_level.is_hr_admin()
}

pub fn authorize_review(
    actor: &Actor,
    employee_unit_id: Option<u64>,
    tier: ReviewTier,
) -> AttendanceResult<()> {
    let allowed = match tier {
        ReviewTier::Supervisor => can_review_as_supervisor(actor, employee_unit_id),
        ReviewTier::Hr => can_review_as_hr(actor),
    };

    if allowed {
        Ok(())
    } else {
        Err(AttendanceError::Unauthorized(match tier {
            ReviewTier::Supervisor => "Only the employee's unit supervisor can review this request",
            ReviewTier::Hr => "Only HR admins can review this request",
        }
        .into()))
    }
}

/// Trims review notes; blank notes become `None`.
pub fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_owned)
}

/// Checks a tier/decision against the current state without touching it.
/// Rejections must carry notes.
pub fn plan_review(
    current: ApprovalStatus,
    tier: ReviewTier,
    decision: ReviewDecision,
    notes: Option<&str>,
) -> AttendanceResult<Transition> {
    if decision == ReviewDecision::Reject && normalize_notes(notes).is_none() {
        return Err(AttendanceError::Validation(
            "Notes are required when rejecting a request".into(),
        ));
    }

    let (from, to) = edge(tier, decision);
    if current != from {
        return Err(AttendanceError::InvalidTransition { from: current, to });
    }

    Ok(Transition {
        tier,
        decision,
        from,
        to,
    })
}

/// Validates a new request against the attendance record it targets.
pub fn open_request(
    record: &AttendanceRecord,
    employee_id: u64,
    reason: &str,
    supporting_document: Option<String>,
) -> AttendanceResult<NewApprovalRequest> {
    if record.employee_id != employee_id {
        return Err(AttendanceError::Unauthorized(
            "Employees can only request approval for their own attendance".into(),
        ));
    }

    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AttendanceError::Validation("A reason is required".into()));
    }

    if record.day_status != DayStatus::Absent {
        return Err(AttendanceError::Precondition(format!(
            "Only ABSENT days can be contested, this day is {}",
            record.day_status
        )));
    }
    if record.has_pending_approval_request {
        return Err(AttendanceError::Precondition(
            "An approval request is already pending for this day".into(),
        ));
    }

    Ok(NewApprovalRequest {
        attendance_id: record.id,
        employee_id,
        reason: reason.to_owned(),
        supporting_document,
    })
}

/// Mirrors a persisted transition onto in-memory values.
pub fn apply(
    request: &mut ApprovalRequest,
    record: &mut AttendanceRecord,
    transition: &Transition,
    reviewer_user_id: u64,
    notes: Option<String>,
    now: DateTime<Utc>,
) {
    request.status = transition.to;
    request.updated_at = now;
    match transition.tier {
        ReviewTier::Supervisor => {
            request.supervisor_reviewed_by = Some(reviewer_user_id);
            request.supervisor_review_notes = notes;
            request.supervisor_reviewed_at = Some(now);
        }
        ReviewTier::Hr => {
            request.hr_reviewed_by = Some(reviewer_user_id);
            request.hr_review_notes = notes;
            request.hr_reviewed_at = Some(now);
        }
    }

    if transition.marks_present() {
        record.day_status = DayStatus::Present;
    }
    if transition.releases_record() {
        record.has_pending_approval_request = false;
    }
    if transition.marks_present() || transition.releases_record() {
        record.updated_at = now;
    }
}

/// Authorizes, plans and applies one review step. Nothing is mutated when
/// any check fails.
#[allow(clippy::too_many_arguments)]
pub fn review(
    request: &mut ApprovalRequest,
    record: &mut AttendanceRecord,
    actor: &Actor,
    employee_unit_id: Option<u64>,
    tier: ReviewTier,
    decision: ReviewDecision,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> AttendanceResult<Transition> {
    authorize_review(actor, employee_unit_id, tier)?;
    let transition = plan_review(request.status, tier, decision, notes)?;
    apply(
        request,
        record,
        &transition,
        actor.user_id,
        normalize_notes(notes),
        now,
    );
    Ok(transition)
}

/// What the actor may do with a request right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReviewCapabilities {
    pub can_review_as_supervisor: bool,
    pub can_review_as_hr: bool,
    /// Authorized for the tier the request is currently waiting on.
    pub can_act_now: bool,
}

pub fn capabilities(
    actor: &Actor,
    employee_unit_id: Option<u64>,
    status: ApprovalStatus,
) -> ReviewCapabilities {
    let supervisor = can_review_as_supervisor(actor, employee_unit_id);
    let hr = can_review_as_hr(actor);
    let can_act_now = match status {
        ApprovalStatus::Pending => supervisor,
        ApprovalStatus::SupervisorApproved => hr,
        ApprovalStatus::HrApproved | ApprovalStatus::Rejected => false,
    };

    ReviewCapabilities {
        can_review_as_supervisor: supervisor,
        can_review_as_hr: hr,
        can_act_now,
    }
}
