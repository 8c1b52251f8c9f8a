use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};

use super::policy::PolicySnapshot;
use crate::error::{AttendanceError, AttendanceResult};
use crate::model::attendance::DayStatus;
use crate::model::employee::EmployeeStatus;

const SECONDS_PER_HOUR: i64 = 3600;
const HOURS_DECIMAL_PLACES: u32 = 2;

/// Result of running the cascade for one employee-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derivation {
    pub status: DayStatus,
    pub hours_worked: Option<Decimal>,
}

/// Clock-out must be strictly after clock-in when both are present.
pub fn validate_clock_times(
    clock_in: Option<NaiveTime>,
    clock_out: Option<NaiveTime>,
) -> AttendanceResult<()> {
    if let (Some(clock_in), Some(clock_out)) = (clock_in, clock_out) {
        if clock_out <= clock_in {
            return Err(AttendanceError::Validation(
                "Clock-out time must be after clock-in time".into(),
            ));
        }
    }
    Ok(())
}

/// Derives the day status, first match wins:
/// suspension, leave, weekend, holiday, then the clock-in deadline.
///
/// A valid clock-in without a clock-out is PRESENT; missing clock-outs are
/// only revisited by the deadline sweep.
pub fn derive_status(
    employee_status: EmployeeStatus,
    date: NaiveDate,
    clock_in: Option<NaiveTime>,
    clock_out: Option<NaiveTime>,
    snapshot: &PolicySnapshot,
) -> Derivation {
    let status = match employee_status {
        EmployeeStatus::Suspended => DayStatus::Suspended,
        EmployeeStatus::OnLeave => DayStatus::OnLeave,
        _ if is_weekend(date) => DayStatus::Weekend,
        _ if snapshot.is_holiday(date) => DayStatus::Holiday,
        _ => match clock_in {
            Some(clock_in) if clock_in <= snapshot.policy.work_start_time => DayStatus::Present,
            _ => DayStatus::Absent,
        },
    };

    Derivation {
        status,
        hours_worked: hours_worked(date, clock_in, clock_out),
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Hours between clock-in and clock-out, rounded half away from zero to
/// two places. `None` unless both times are present.
pub fn hours_worked(
    date: NaiveDate,
    clock_in: Option<NaiveTime>,
    clock_out: Option<NaiveTime>,
) -> Option<Decimal> {
    let (clock_in, clock_out) = (clock_in?, clock_out?);
    let seconds = (date.and_time(clock_out) - date.and_time(clock_in)).num_seconds();

    let mut hours = (Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR))
        .round_dp_with_strategy(HOURS_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    // Pad to a fixed scale so 8 hours reads as 8.00.
    hours.rescale(HOURS_DECIMAL_PLACES);
    Some(hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::time_policy::TimePolicy;
    use assert_matches::assert_matches;

    // 2026-03-02 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    fn t(hour: u32, minute: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(hour, minute, 0)
    }

    fn snapshot() -> PolicySnapshot {
        PolicySnapshot::default()
    }

    #[test]
    fn suspension_outranks_everything() {
        let holidays = PolicySnapshot::new(TimePolicy::fallback(), [monday(), saturday()]);
        for date in [monday(), saturday()] {
            for clock_in in [None, t(8, 0), t(11, 0)] {
                let derived =
                    derive_status(EmployeeStatus::Suspended, date, clock_in, t(17, 0), &holidays);
                assert_eq!(derived.status, DayStatus::Suspended);
            }
        }
    }

    #[test]
    fn leave_outranks_calendar_and_clock() {
        let derived = derive_status(EmployeeStatus::OnLeave, saturday(), t(8, 0), None, &snapshot());
        assert_eq!(derived.status, DayStatus::OnLeave);
    }

    #[test]
    fn weekend_wins_over_holiday() {
        let snapshot = PolicySnapshot::new(TimePolicy::fallback(), [saturday()]);
        let derived = derive_status(EmployeeStatus::Active, saturday(), t(8, 0), None, &snapshot);
        assert_eq!(derived.status, DayStatus::Weekend);
    }

    #[test]
    fn weekday_holiday() {
        let snapshot = PolicySnapshot::new(TimePolicy::fallback(), [monday()]);
        let derived = derive_status(EmployeeStatus::Active, monday(), None, None, &snapshot);
        assert_eq!(derived.status, DayStatus::Holiday);
    }

    #[test]
    fn clock_in_deadline() {
        let s = snapshot();
        let status = |clock_in| derive_status(EmployeeStatus::Active, monday(), clock_in, None, &s).status;

        assert_eq!(status(t(8, 59)), DayStatus::Present);
        assert_eq!(status(t(9, 0)), DayStatus::Present);
        assert_eq!(status(t(9, 1)), DayStatus::Absent);
        assert_eq!(status(None), DayStatus::Absent);
    }

    #[test]
    fn deadline_comes_from_the_policy() {
        let policy = TimePolicy {
            work_start_time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            ..TimePolicy::fallback()
        };
        let s = PolicySnapshot::new(policy, []);
        let derived = derive_status(EmployeeStatus::Active, monday(), t(8, 45), None, &s);
        assert_eq!(derived.status, DayStatus::Absent);
    }

    #[test]
    fn terminated_and_resigned_follow_the_clock() {
        for status in [EmployeeStatus::Terminated, EmployeeStatus::Resigned] {
            let derived = derive_status(status, monday(), t(8, 30), None, &snapshot());
            assert_eq!(derived.status, DayStatus::Present);
        }
    }

    #[test]
    fn hours_are_pinned_to_two_places() {
        assert_eq!(hours_worked(monday(), t(9, 0), t(17, 0)).unwrap().to_string(), "8.00");
        assert_eq!(hours_worked(monday(), t(9, 0), t(17, 20)).unwrap().to_string(), "8.33");
        assert_eq!(hours_worked(monday(), t(9, 0), t(9, 10)).unwrap().to_string(), "0.17");
        assert_eq!(
            hours_worked(
                monday(),
                NaiveTime::from_hms_opt(9, 0, 0),
                NaiveTime::from_hms_opt(9, 0, 18)
            )
            .unwrap()
            .to_string(),
            "0.01"
        );
    }

    #[test]
    fn hours_need_both_times() {
        assert_eq!(hours_worked(monday(), t(9, 0), None), None);
        assert_eq!(hours_worked(monday(), None, t(17, 0)), None);
        let derived = derive_status(EmployeeStatus::Active, monday(), t(8, 0), None, &snapshot());
        assert_eq!(derived.hours_worked, None);
    }

    #[test]
    fn hours_are_computed_even_on_non_working_days() {
        let derived =
            derive_status(EmployeeStatus::Active, saturday(), t(10, 0), t(14, 30), &snapshot());
        assert_eq!(derived.status, DayStatus::Weekend);
        assert_eq!(derived.hours_worked.unwrap().to_string(), "4.50");
    }

    #[test]
    fn derivation_is_deterministic() {
        let s = snapshot();
        let first = derive_status(EmployeeStatus::Active, monday(), t(8, 45), t(17, 10), &s);
        let second = derive_status(EmployeeStatus::Active, monday(), t(8, 45), t(17, 10), &s);
        assert_eq!(first, second);
    }

    #[test]
    fn clock_out_must_follow_clock_in() {
        assert!(validate_clock_times(t(9, 0), t(17, 0)).is_ok());
        assert!(validate_clock_times(t(9, 0), None).is_ok());
        assert!(validate_clock_times(None, t(17, 0)).is_ok());
        assert_matches!(
            validate_clock_times(t(9, 0), t(9, 0)),
            Err(AttendanceError::Validation(_))
        );
        assert_matches!(
            validate_clock_times(t(17, 0), t(9, 0)),
            Err(AttendanceError::Validation(_))
        );
    }
}
