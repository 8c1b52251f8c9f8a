use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::attendance::{AttendanceRecord, DayStatus};
use crate::model::time_policy::TimePolicy;

/// Latest date whose clock-out deadline has passed at `now`, or `None` when
/// the policy does not enforce clock-outs.
///
/// Days up to and including the cutoff may have PRESENT-without-clock-out
/// records re-marked ABSENT.
pub fn sweep_cutoff(policy: &TimePolicy, now: NaiveDateTime) -> Option<NaiveDate> {
    if !policy.enforces_clock_out() {
        return None;
    }

    let today = now.date();
    if now.time() > policy.clock_out_deadline {
        Some(today)
    } else {
        today.checked_sub_days(Days::new(1))
    }
}

/// A self-service clock-out at `time` is still accepted. Once the deadline
/// has passed the day belongs to the sweep.
pub fn clock_out_allowed(policy: &TimePolicy, time: NaiveTime) -> bool {
    !policy.enforces_clock_out() || time <= policy.clock_out_deadline
}

/// Clocked in on time, never clocked out. Manual marks and HR overrides are
/// left alone.
pub fn missed_clock_out(record: &AttendanceRecord) -> bool {
    record.day_status == DayStatus::Present
        && !record.is_manual_entry
        && record.clock_in_time.is_some()
        && record.clock_out_time.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn enforcing() -> TimePolicy {
        TimePolicy {
            auto_mark_absent_after_deadline: true,
            require_clock_out: true,
            ..TimePolicy::fallback()
        }
    }

    fn at(date: (i32, u32, u32), hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn disabled_without_both_toggles() {
        assert_eq!(sweep_cutoff(&TimePolicy::fallback(), at((2026, 3, 2), 23, 0)), None);
        let half = TimePolicy {
            require_clock_out: true,
            ..TimePolicy::fallback()
        };
        assert_eq!(sweep_cutoff(&half, at((2026, 3, 2), 23, 0)), None);
    }

    #[test]
    fn today_is_included_once_the_deadline_passes() {
        let policy = enforcing();
        assert_eq!(
            sweep_cutoff(&policy, at((2026, 3, 2), 18, 0)),
            NaiveDate::from_ymd_opt(2026, 3, 1)
        );
        assert_eq!(
            sweep_cutoff(&policy, at((2026, 3, 2), 18, 2)),
            NaiveDate::from_ymd_opt(2026, 3, 2)
        );
    }

    #[test]
    fn only_open_present_days_are_swept() {
        let mut record = AttendanceRecord {
            id: 1,
            employee_id: 7,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            clock_in_time: NaiveTime::from_hms_opt(8, 50, 0),
            clock_out_time: None,
            day_status: DayStatus::Present,
            hours_worked: None,
            has_pending_approval_request: false,
            is_manual_entry: false,
            marked_by: None,
            manual_entry_reason: None,
            remarks: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(missed_clock_out(&record));

        record.clock_out_time = NaiveTime::from_hms_opt(17, 0, 0);
        assert!(!missed_clock_out(&record));

        record.clock_out_time = None;
        record.is_manual_entry = true;
        assert!(!missed_clock_out(&record));

        record.is_manual_entry = false;
        record.day_status = DayStatus::Weekend;
        assert!(!missed_clock_out(&record));
    }

    #[test]
    fn late_clock_out_is_refused_only_when_enforced() {
        let deadline = TimePolicy::fallback().clock_out_deadline;
        let late = NaiveTime::from_hms_opt(19, 0, 0).unwrap();

        assert!(clock_out_allowed(&TimePolicy::fallback(), late));
        assert!(clock_out_allowed(&enforcing(), deadline));
        assert!(!clock_out_allowed(&enforcing(), late));
    }
}
