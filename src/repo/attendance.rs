use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::MySqlConnection;

use crate::engine::status::Derivation;
use crate::model::attendance::{AttendanceRecord, DayStatus};

const ATTENDANCE_COLUMNS: &str = "id, employee_id, date, clock_in_time, clock_out_time, \
     day_status, hours_worked, has_pending_approval_request, is_manual_entry, marked_by, \
     manual_entry_reason, remarks, created_at, updated_at";

/// Who keyed in a manual entry and why.
#[derive(Debug, Clone)]
pub struct ManualMark {
    pub marked_by: u64,
    pub reason: String,
    pub remarks: Option<String>,
}

/// A fully derived row ready to be written for `(employee_id, date)`.
#[derive(Debug, Clone)]
pub struct AttendanceWrite {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub clock_in_time: Option<NaiveTime>,
    pub clock_out_time: Option<NaiveTime>,
    pub derivation: Derivation,
    pub manual: Option<ManualMark>,
    pub now: DateTime<Utc>,
}

/// Reason stored when HR forces a day to PRESENT without one on file.
pub const OVERRIDE_REASON: &str = "Marked present by HR override";

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

pub struct AttendanceRepo;

impl AttendanceRepo {
    pub async fn find_by_id(
        conn: &mut MySqlConnection,
        id: u64,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?");
        sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_id_for_update(
        conn: &mut MySqlConnection,
        id: u64,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ? FOR UPDATE");
        sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_for_day(
        conn: &mut MySqlConnection,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
        );
        sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(conn)
            .await
    }

    /// Locks the `(employee_id, date)` slot. With no row present the unique
    /// index gap is locked, so a concurrent first write for the same day
    /// waits on this transaction.
    pub async fn find_for_day_for_update(
        conn: &mut MySqlConnection,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE employee_id = ? AND date = ? FOR UPDATE"
        );
        sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(conn)
            .await
    }

    /// Inserts or rewrites the day's row. A manual mark, once set, is never
    /// cleared by a later non-manual write.
    pub async fn upsert(
        conn: &mut MySqlConnection,
        write: &AttendanceWrite,
    ) -> Result<AttendanceRecord, sqlx::Error> {
        let manual = write.manual.as_ref();
        sqlx::query(
            r#"
            INSERT INTO attendance (
                employee_id, date, clock_in_time, clock_out_time, day_status, hours_worked,
                is_manual_entry, marked_by, manual_entry_reason, remarks, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                clock_in_time = VALUES(clock_in_time),
                clock_out_time = VALUES(clock_out_time),
                day_status = VALUES(day_status),
                hours_worked = VALUES(hours_worked),
                is_manual_entry = is_manual_entry OR VALUES(is_manual_entry),
                marked_by = COALESCE(VALUES(marked_by), marked_by),
                manual_entry_reason = COALESCE(VALUES(manual_entry_reason), manual_entry_reason),
                remarks = COALESCE(VALUES(remarks), remarks),
                updated_at = VALUES(updated_at)
            "#,
        )
        .bind(write.employee_id)
        .bind(write.date)
        .bind(write.clock_in_time)
        .bind(write.clock_out_time)
        .bind(write.derivation.status)
        .bind(write.derivation.hours_worked)
        .bind(manual.is_some())
        .bind(manual.map(|m| m.marked_by))
        .bind(manual.map(|m| m.reason.as_str()))
        .bind(manual.and_then(|m| m.remarks.as_deref()))
        .bind(write.now)
        .bind(write.now)
        .execute(&mut *conn)
        .await?;

        Self::find_for_day(conn, write.employee_id, write.date)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Sets the pending flag only if it is currently clear. Returns whether
    /// the flag was taken.
    pub async fn reserve_for_approval(
        conn: &mut MySqlConnection,
        id: u64,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET has_pending_approval_request = TRUE, updated_at = ?
            WHERE id = ?
            AND day_status = ?
            AND has_pending_approval_request = FALSE
            "#,
        )
        .bind(now)
        .bind(id)
        .bind(DayStatus::Absent)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Applies the outcome of a terminal review: optionally forces the day to
    /// PRESENT and always clears the pending flag.
    pub async fn settle_approval(
        conn: &mut MySqlConnection,
        id: u64,
        mark_present: bool,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = if mark_present {
            sqlx::query(
                r#"
                UPDATE attendance
                SET day_status = ?, has_pending_approval_request = FALSE, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(DayStatus::Present)
            .bind(now)
            .bind(id)
            .execute(conn)
            .await?
        } else {
            sqlx::query(
                r#"
                UPDATE attendance
                SET has_pending_approval_request = FALSE, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(now)
            .bind(id)
            .execute(conn)
            .await?
        };

        Ok(result.rows_affected())
    }

    pub async fn find_many_for_update(
        conn: &mut MySqlConnection,
        ids: &[u64],
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id IN ({}) ORDER BY id FOR UPDATE",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, AttendanceRecord>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        query.fetch_all(conn).await
    }

    /// Privileged override: forces the given rows to PRESENT and stamps them
    /// as marked by `marked_by`, which keeps the clock-out sweep off them.
    /// Rows with a pending approval request are skipped.
    pub async fn mark_present(
        conn: &mut MySqlConnection,
        ids: &[u64],
        marked_by: u64,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE attendance SET day_status = ?, is_manual_entry = TRUE, marked_by = ?, \
             manual_entry_reason = COALESCE(manual_entry_reason, ?), updated_at = ? \
             WHERE id IN ({}) AND has_pending_approval_request = FALSE",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql)
            .bind(DayStatus::Present)
            .bind(marked_by)
            .bind(OVERRIDE_REASON)
            .bind(now);
        for id in ids {
            query = query.bind(*id);
        }
        let result = query.execute(conn).await?;

        Ok(result.rows_affected())
    }

    /// PRESENT rows up to `cutoff` that were clocked in but never out, not
    /// marked by staff and not backed by an HR-approved request. Locked for
    /// the sweep.
    pub async fn open_days_for_update(
        conn: &mut MySqlConnection,
        cutoff: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS} FROM attendance a
            WHERE a.date <= ?
            AND a.day_status = ?
            AND a.clock_in_time IS NOT NULL
            AND a.clock_out_time IS NULL
            AND a.is_manual_entry = FALSE
            AND NOT EXISTS (
                SELECT 1 FROM approval_requests r
                WHERE r.attendance_id = a.id AND r.status = 'HR_APPROVED'
            )
            FOR UPDATE
            "#
        );
        sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(cutoff)
            .bind(DayStatus::Present)
            .fetch_all(conn)
            .await
    }

    /// Re-marks the given rows ABSENT, but only those still PRESENT with an
    /// open clock-in.
    pub async fn mark_absent(
        conn: &mut MySqlConnection,
        ids: &[u64],
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE attendance SET day_status = ?, hours_worked = NULL, updated_at = ? \
             WHERE id IN ({}) AND day_status = ? AND clock_out_time IS NULL",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql)
            .bind(DayStatus::Absent)
            .bind(now);
        for id in ids {
            query = query.bind(*id);
        }
        let result = query
            .bind(DayStatus::Present)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_lists() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
