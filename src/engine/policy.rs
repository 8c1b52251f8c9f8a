use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::warn;

use crate::error::{AttendanceError, AttendanceResult};
use crate::model::holiday::Holiday;
use crate::model::time_policy::TimePolicy;

/// Policy and holiday calendar read together for one derivation.
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    pub policy: TimePolicy,
    holidays: BTreeSet<NaiveDate>,
}

impl PolicySnapshot {
    pub fn new(policy: TimePolicy, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            policy,
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Builds a snapshot from stored holiday rows, ignoring inactive ones.
    pub fn from_rows(policy: TimePolicy, holidays: &[Holiday]) -> Self {
        Self::new(
            policy,
            holidays.iter().filter(|h| h.is_active).map(|h| h.date),
        )
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

impl Default for PolicySnapshot {
    fn default() -> Self {
        Self::new(TimePolicy::fallback(), [])
    }
}

/// Picks the governing policy from the rows flagged active.
///
/// No active row means the built-in fallback. More than one should not
/// happen (writes refuse it) but legacy data may carry it; the most
/// recently updated row wins and the conflict is logged.
pub fn resolve_active(mut active: Vec<TimePolicy>) -> TimePolicy {
    match active.len() {
        0 => TimePolicy::fallback(),
        1 => active.remove(0),
        n => {
            warn!(active_policies = n, "More than one active time policy, using latest");
            active.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
            active.remove(0)
        }
    }
}

/// Rejects creating an active policy while another one is active.
pub fn ensure_no_other_active(
    currently_active: Option<u64>,
    candidate: Option<u64>,
) -> AttendanceResult<()> {
    match currently_active {
        Some(active_id) if Some(active_id) != candidate => Err(AttendanceError::Precondition(
            format!("Time policy {active_id} is already active; activate the new policy instead"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn policy(id: u64, updated: &str) -> TimePolicy {
        TimePolicy {
            id,
            is_active: true,
            updated_at: Some(NaiveDateTime::parse_from_str(updated, "%Y-%m-%d %H:%M").unwrap()),
            ..TimePolicy::fallback()
        }
    }

    #[test]
    fn no_active_policy_falls_back_to_defaults() {
        let resolved = resolve_active(vec![]);
        assert!(resolved.is_fallback());
    }

    #[test]
    fn single_active_policy_is_used() {
        let resolved = resolve_active(vec![policy(4, "2026-01-01 08:00")]);
        assert_eq!(resolved.id, 4);
    }

    #[test]
    fn latest_policy_wins_when_several_are_active() {
        let resolved = resolve_active(vec![
            policy(1, "2026-01-01 08:00"),
            policy(2, "2026-02-01 08:00"),
            policy(3, "2025-12-01 08:00"),
        ]);
        assert_eq!(resolved.id, 2);
    }

    #[test]
    fn second_active_policy_is_refused() {
        assert!(ensure_no_other_active(None, None).is_ok());
        assert!(ensure_no_other_active(Some(3), Some(3)).is_ok());
        assert!(ensure_no_other_active(Some(3), None).is_err());
        assert!(ensure_no_other_active(Some(3), Some(4)).is_err());
    }

    #[test]
    fn inactive_holidays_are_ignored() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let other = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        let rows = vec![
            Holiday { id: 1, name: "Independence Day".into(), date, is_active: true },
            Holiday { id: 2, name: "Christmas".into(), date: other, is_active: false },
        ];
        let snapshot = PolicySnapshot::from_rows(TimePolicy::fallback(), &rows);
        assert!(snapshot.is_holiday(date));
        assert!(!snapshot.is_holiday(other));
    }
}
