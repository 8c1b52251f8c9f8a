use chrono::NaiveDate;
use sqlx::MySqlConnection;

use crate::engine::policy::{resolve_active, PolicySnapshot};
use crate::model::holiday::Holiday;
use crate::model::time_policy::{NewTimePolicy, TimePolicy};

const POLICY_COLUMNS: &str = "id, work_start_time, work_end_time, clock_out_deadline, \
     standard_work_hours, auto_mark_absent_after_deadline, require_clock_out, is_active, \
     updated_at";

pub struct PolicyRepo;

impl PolicyRepo {
    pub async fn find_by_id(
        conn: &mut MySqlConnection,
        id: u64,
    ) -> Result<Option<TimePolicy>, sqlx::Error> {
        let sql = format!("SELECT {POLICY_COLUMNS} FROM time_policies WHERE id = ?");
        sqlx::query_as::<_, TimePolicy>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn active_policies(
        conn: &mut MySqlConnection,
    ) -> Result<Vec<TimePolicy>, sqlx::Error> {
        let sql = format!("SELECT {POLICY_COLUMNS} FROM time_policies WHERE is_active = TRUE");
        sqlx::query_as::<_, TimePolicy>(&sql).fetch_all(conn).await
    }

    /// Governing policy, or the fallback when none is active.
    pub async fn current(conn: &mut MySqlConnection) -> Result<TimePolicy, sqlx::Error> {
        Ok(resolve_active(Self::active_policies(conn).await?))
    }

    /// Id of the active policy, locking the active slot until commit.
    pub async fn active_id_for_update(
        conn: &mut MySqlConnection,
    ) -> Result<Option<u64>, sqlx::Error> {
        sqlx::query_scalar::<_, u64>(
            "SELECT id FROM time_policies WHERE is_active = TRUE ORDER BY updated_at DESC, id DESC LIMIT 1 FOR UPDATE",
        )
        .fetch_optional(conn)
        .await
    }

    pub async fn insert(
        conn: &mut MySqlConnection,
        new: &NewTimePolicy,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO time_policies (
                work_start_time, work_end_time, clock_out_deadline, standard_work_hours,
                auto_mark_absent_after_deadline, require_clock_out, is_active
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.work_start_time)
        .bind(new.work_end_time)
        .bind(new.clock_out_deadline)
        .bind(new.standard_work_hours)
        .bind(new.auto_mark_absent_after_deadline)
        .bind(new.require_clock_out)
        .bind(new.is_active)
        .execute(conn)
        .await?;

        Ok(result.last_insert_id())
    }

    /// Makes `id` the only active policy in a single statement.
    pub async fn activate(conn: &mut MySqlConnection, id: u64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE time_policies SET is_active = (id = ?)")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn active_holidays(
        conn: &mut MySqlConnection,
    ) -> Result<Vec<Holiday>, sqlx::Error> {
        sqlx::query_as::<_, Holiday>(
            "SELECT id, name, date, is_active FROM holidays WHERE is_active = TRUE ORDER BY date",
        )
        .fetch_all(conn)
        .await
    }

    pub async fn holidays_on(
        conn: &mut MySqlConnection,
        date: NaiveDate,
    ) -> Result<Vec<Holiday>, sqlx::Error> {
        sqlx::query_as::<_, Holiday>(
            "SELECT id, name, date, is_active FROM holidays WHERE date = ? AND is_active = TRUE",
        )
        .bind(date)
        .fetch_all(conn)
        .await
    }

    /// Policy and holidays for deriving `date`, read on one connection.
    pub async fn snapshot_for(
        conn: &mut MySqlConnection,
        date: NaiveDate,
    ) -> Result<PolicySnapshot, sqlx::Error> {
        let policy = Self::current(&mut *conn).await?;
        let holidays = Self::holidays_on(conn, date).await?;
        Ok(PolicySnapshot::from_rows(policy, &holidays))
    }
}
