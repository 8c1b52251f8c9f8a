use crate::model::approval_request::{ApprovalRequest, ApprovalStatus};
use crate::model::employee::Actor;
use crate::engine::workflow::can_review_as_hr;

/// Which approval requests an actor may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
    /// HR admins and superusers.
    All,
    /// Unit supervisors: their unit's requests still waiting at the first tier.
    UnitPending(u64),
    /// Everyone else: only their own requests.
    Own(u64),
    /// Accounts without an employee profile and no review authority.
    Nothing,
}

pub fn scope_for(actor: &Actor) -> RequestScope {
    if can_review_as_hr(actor) {
        RequestScope::All
    } else if let Some(unit_id) = actor.supervised_unit_id {
        RequestScope::UnitPending(unit_id)
    } else if let Some(employee_id) = actor.employee_id {
        RequestScope::Own(employee_id)
    } else {
        RequestScope::Nothing
    }
}

/// Single-request visibility. Broader than the list scope: a supervisor can
/// still open a request from their unit after signing it off, and everyone
/// can open their own.
pub fn can_view(actor: &Actor, request: &ApprovalRequest, employee_unit_id: Option<u64>) -> bool {
    if actor.is_self(request.employee_id) {
        return true;
    }
    match scope_for(actor) {
        RequestScope::All => true,
        RequestScope::UnitPending(unit_id) => employee_unit_id == Some(unit_id),
        RequestScope::Own(_) | RequestScope::Nothing => false,
    }
}

impl RequestScope {
    /// In-memory form of the SQL filter used for listing.
    pub fn admits(&self, request: &ApprovalRequest, employee_unit_id: Option<u64>) -> bool {
        match *self {
            RequestScope::All => true,
            RequestScope::UnitPending(unit_id) => {
                employee_unit_id == Some(unit_id) && request.status == ApprovalStatus::Pending
            }
            RequestScope::Own(employee_id) => request.employee_id == employee_id,
            RequestScope::Nothing => false,
        }
    }
}
