use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::mysql_string_enum;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// Waiting for the unit supervisor.
    Pending,
    /// Waiting for HR.
    SupervisorApproved,
    HrApproved,
    Rejected,
}

mysql_string_enum!(ApprovalStatus);

impl ApprovalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApprovalStatus::HrApproved | ApprovalStatus::Rejected)
    }
}

/// Employee request to turn an ABSENT day into PRESENT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 3,
    "attendance_id": 42,
    "employee_id": 7,
    "reason": "Badge reader was down at the east entrance",
    "supporting_document": null,
    "status": "SUPERVISOR_APPROVED",
    "supervisor_reviewed_by": 12,
    "supervisor_review_notes": "Confirmed with facilities",
    "supervisor_reviewed_at": "2026-03-03T10:00:00Z",
    "hr_reviewed_by": null,
    "hr_review_notes": null,
    "hr_reviewed_at": null,
    "created_at": "2026-03-02T18:30:00Z",
    "updated_at": "2026-03-03T10:00:00Z"
}))]
pub struct ApprovalRequest {
    pub id: u64,
    pub attendance_id: u64,
    pub employee_id: u64,
    pub reason: String,
    /// Storage path of an uploaded document, if any.
    pub supporting_document: Option<String>,
    pub status: ApprovalStatus,

    pub supervisor_reviewed_by: Option<u64>,
    pub supervisor_review_notes: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub supervisor_reviewed_at: Option<DateTime<Utc>>,

    pub hr_reviewed_by: Option<u64>,
    pub hr_review_notes: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub hr_reviewed_at: Option<DateTime<Utc>>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a fresh request, before it has an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApprovalRequest {
    pub attendance_id: u64,
    pub employee_id: u64,
    pub reason: String,
    pub supporting_document: Option<String>,
}

impl ApprovalRequest {
    pub fn from_new(id: u64, new: NewApprovalRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            attendance_id: new.attendance_id,
            employee_id: new.employee_id,
            reason: new.reason,
            supporting_document: new.supporting_document,
            status: ApprovalStatus::Pending,
            supervisor_reviewed_by: None,
            supervisor_review_notes: None,
            supervisor_reviewed_at: None,
            hr_reviewed_by: None,
            hr_review_notes: None,
            hr_reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Number of requests per status.
#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
pub struct ApprovalStatusCounts {
    pub pending: i64,
    pub supervisor_approved: i64,
    pub hr_approved: i64,
    pub rejected: i64,
}

impl ApprovalStatusCounts {
    pub fn add(&mut self, status: ApprovalStatus, count: i64) {
        match status {
            ApprovalStatus::Pending => self.pending += count,
            ApprovalStatus::SupervisorApproved => self.supervisor_approved += count,
            ApprovalStatus::HrApproved => self.hr_approved += count,
            ApprovalStatus::Rejected => self.rejected += count,
        }
    }
}
