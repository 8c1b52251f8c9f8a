use chrono::{NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AttendanceError;

/// Working-time rules applied to every attendance derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TimePolicy {
    /// `0` for the built-in fallback used when no row is active.
    #[schema(example = 1)]
    pub id: u64,

    /// Latest clock-in still counted as on time.
    #[schema(example = "09:00:00", value_type = String)]
    pub work_start_time: NaiveTime,

    #[schema(example = "17:00:00", value_type = String)]
    pub work_end_time: NaiveTime,

    #[schema(example = "18:01:00", value_type = String)]
    pub clock_out_deadline: NaiveTime,

    #[schema(example = "8.00", value_type = String)]
    pub standard_work_hours: Decimal,

    pub auto_mark_absent_after_deadline: bool,

    pub require_clock_out: bool,

    pub is_active: bool,

    #[schema(example = "2026-01-01T08:00:00", value_type = Option<String>, format = "date-time")]
    pub updated_at: Option<NaiveDateTime>,
}

impl TimePolicy {
    pub const FALLBACK_ID: u64 = 0;

    /// Defaults used when no policy row is active: 09:00 start, 17:00 end,
    /// 18:01 clock-out deadline, 8 standard hours, no enforcement toggles.
    pub fn fallback() -> Self {
        Self {
            id: Self::FALLBACK_ID,
            work_start_time: hm(9, 0),
            work_end_time: hm(17, 0),
            clock_out_deadline: hm(18, 1),
            standard_work_hours: Decimal::new(800, 2),
            auto_mark_absent_after_deadline: false,
            require_clock_out: false,
            is_active: false,
            updated_at: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.id == Self::FALLBACK_ID
    }

    /// Both toggles must be on before missing clock-outs are swept.
    pub fn enforces_clock_out(&self) -> bool {
        self.auto_mark_absent_after_deadline && self.require_clock_out
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewTimePolicy {
    #[schema(example = "09:00:00", value_type = String)]
    pub work_start_time: NaiveTime,

    #[schema(example = "17:00:00", value_type = String)]
    pub work_end_time: NaiveTime,

    #[schema(example = "18:01:00", value_type = String)]
    pub clock_out_deadline: NaiveTime,

    #[schema(example = "8.00", value_type = String)]
    pub standard_work_hours: Decimal,

    #[serde(default)]
    pub auto_mark_absent_after_deadline: bool,

    #[serde(default)]
    pub require_clock_out: bool,

    #[serde(default)]
    pub is_active: bool,
}

impl NewTimePolicy {
    pub fn validate(&self) -> Result<(), AttendanceError> {
        if self.work_end_time <= self.work_start_time {
            return Err(AttendanceError::Validation(
                "work_end_time must be after work_start_time".into(),
            ));
        }
        if self.clock_out_deadline < self.work_end_time {
            return Err(AttendanceError::Validation(
                "clock_out_deadline cannot be before work_end_time".into(),
            ));
        }
        if self.standard_work_hours <= Decimal::ZERO || self.standard_work_hours > Decimal::from(24)
        {
            return Err(AttendanceError::Validation(
                "standard_work_hours must be between 0 and 24".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn new_policy() -> NewTimePolicy {
        NewTimePolicy {
            work_start_time: hm(9, 0),
            work_end_time: hm(17, 0),
            clock_out_deadline: hm(18, 1),
            standard_work_hours: Decimal::new(800, 2),
            auto_mark_absent_after_deadline: false,
            require_clock_out: false,
            is_active: true,
        }
    }

    #[test]
    fn fallback_matches_office_defaults() {
        let policy = TimePolicy::fallback();
        assert!(policy.is_fallback());
        assert_eq!(policy.work_start_time, hm(9, 0));
        assert_eq!(policy.clock_out_deadline, hm(18, 1));
        assert_eq!(policy.standard_work_hours.to_string(), "8.00");
        assert!(!policy.enforces_clock_out());
    }

    #[test]
    fn enforcement_needs_both_toggles() {
        let mut policy = TimePolicy::fallback();
        policy.auto_mark_absent_after_deadline = true;
        assert!(!policy.enforces_clock_out());
        policy.require_clock_out = true;
        assert!(policy.enforces_clock_out());
    }

    #[test]
    fn new_policy_validation() {
        assert!(new_policy().validate().is_ok());

        let mut inverted = new_policy();
        inverted.work_end_time = hm(8, 0);
        assert_matches!(inverted.validate(), Err(AttendanceError::Validation(_)));

        let mut early_deadline = new_policy();
        early_deadline.clock_out_deadline = hm(16, 0);
        assert_matches!(early_deadline.validate(), Err(AttendanceError::Validation(_)));

        let mut no_hours = new_policy();
        no_hours.standard_work_hours = Decimal::ZERO;
        assert_matches!(no_hours.validate(), Err(AttendanceError::Validation(_)));
    }
}
