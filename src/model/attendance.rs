use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::mysql_string_enum;
use super::time_policy::TimePolicy;

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
pub enum DayStatus {
    Present,
    Absent,
    OnLeave,
    Weekend,
    Holiday,
    Suspended,
}

mysql_string_enum!(DayStatus);

/// One employee's attendance for one calendar day.
///
/// `day_status` and `hours_worked` are always produced by the status engine
/// (or by the privileged approval override); callers never supply them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 42)]
    pub id: u64,

    #[schema(example = 7)]
    pub employee_id: u64,

    #[schema(example = "2026-03-02", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "08:55:00", value_type = Option<String>)]
    pub clock_in_time: Option<NaiveTime>,

    #[schema(example = "17:05:00", value_type = Option<String>)]
    pub clock_out_time: Option<NaiveTime>,

    pub day_status: DayStatus,

    #[schema(example = "8.17", value_type = Option<String>)]
    pub hours_worked: Option<Decimal>,

    pub has_pending_approval_request: bool,

    pub is_manual_entry: bool,

    #[schema(nullable = true)]
    pub marked_by: Option<u64>,

    #[schema(nullable = true)]
    pub manual_entry_reason: Option<String>,

    #[schema(nullable = true)]
    pub remarks: Option<String>,

    #[schema(example = "2026-03-02T08:55:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(example = "2026-03-02T17:05:00Z", value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// An approval request may only be opened against an ABSENT day that
    /// has no request in flight.
    pub fn can_request_approval(&self) -> bool {
        self.day_status == DayStatus::Absent && !self.has_pending_approval_request
    }

    pub fn is_late(&self, policy: &TimePolicy) -> bool {
        self.clock_in_time
            .is_some_and(|clock_in| clock_in > policy.work_start_time)
    }

    pub fn is_full_day(&self, policy: &TimePolicy) -> bool {
        self.hours_worked
            .is_some_and(|hours| hours >= policy.standard_work_hours)
    }

    pub fn is_early_departure(&self, policy: &TimePolicy) -> bool {
        self.clock_out_time
            .is_some_and(|clock_out| clock_out < policy.work_end_time)
    }
}

/// Per-day summary returned by the status lookup.
#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceSummary {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub is_late: bool,
    pub is_full_day: bool,
    pub is_early_departure: bool,
}

impl AttendanceSummary {
    pub fn new(record: AttendanceRecord, policy: &TimePolicy) -> Self {
        Self {
            is_late: record.is_late(policy),
            is_full_day: record.is_full_day(policy),
            is_early_departure: record.is_early_departure(policy),
            record,
        }
    }
}
