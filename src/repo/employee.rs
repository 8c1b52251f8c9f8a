use sqlx::MySqlConnection;

use crate::model::employee::{Actor, Employee};

const EMPLOYEE_COLUMNS: &str =
    "id, first_name, last_name, email, unit_id, employee_status, approval_level";

/// Read-only lookups into the employee directory.
pub struct EmployeeRepo;

impl EmployeeRepo {
    pub async fn find(
        conn: &mut MySqlConnection,
        employee_id: u64,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        sqlx::query_as::<_, Employee>(&sql)
            .bind(employee_id)
            .fetch_optional(conn)
            .await
    }

    /// Resolves an authenticated user into review authority. Inactive
    /// accounts resolve to `None`.
    pub async fn actor_for_user(
        conn: &mut MySqlConnection,
        user_id: u64,
    ) -> Result<Option<Actor>, sqlx::Error> {
        sqlx::query_as::<_, Actor>(
            r#"
            SELECT
                u.id AS user_id,
                u.employee_id,
                COALESCE(e.approval_level, 'STAFF') AS approval_level,
                u.is_superuser,
                e.unit_id,
                s.id AS supervised_unit_id
            FROM users u
            LEFT JOIN employees e ON e.id = u.employee_id
            LEFT JOIN units s ON s.supervisor_id = u.employee_id
            WHERE u.id = ?
            AND u.is_active = TRUE
            "#,
        )
        .bind(user_id)
        .fetch_optional(conn)
        .await
    }
}
