use chrono::{DateTime, Utc};
use sqlx::MySqlConnection;

use crate::engine::visibility::RequestScope;
use crate::engine::workflow::{ReviewTier, Transition};
use crate::model::approval_request::{
    ApprovalRequest, ApprovalStatus, ApprovalStatusCounts, NewApprovalRequest,
};

const REQUEST_COLUMNS: &str = "r.id, r.attendance_id, r.employee_id, r.reason, \
     r.supporting_document, r.status, r.supervisor_reviewed_by, r.supervisor_review_notes, \
     r.supervisor_reviewed_at, r.hr_reviewed_by, r.hr_review_notes, r.hr_reviewed_at, \
     r.created_at, r.updated_at";

const REQUEST_FROM: &str =
    "FROM approval_requests r JOIN employees e ON e.id = r.employee_id";

/// Listing filter. `page` is 1-based.
#[derive(Debug, Clone, Copy)]
pub struct ListFilter {
    pub status: Option<ApprovalStatus>,
    pub page: u32,
    pub per_page: u32,
}

/// WHERE fragment and its bind values for a visibility scope.
fn scope_clause(scope: RequestScope) -> (&'static str, Vec<u64>) {
    match scope {
        RequestScope::All => ("1 = 1", Vec::new()),
        RequestScope::UnitPending(unit_id) => {
            ("e.unit_id = ? AND r.status = 'PENDING'", vec![unit_id])
        }
        RequestScope::Own(employee_id) => ("r.employee_id = ?", vec![employee_id]),
        RequestScope::Nothing => ("1 = 0", Vec::new()),
    }
}

pub struct ApprovalRepo;

impl ApprovalRepo {
    pub async fn insert(
        conn: &mut MySqlConnection,
        new: &NewApprovalRequest,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO approval_requests (
                attendance_id, employee_id, reason, supporting_document, status,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.attendance_id)
        .bind(new.employee_id)
        .bind(&new.reason)
        .bind(new.supporting_document.as_deref())
        .bind(ApprovalStatus::Pending)
        .bind(now)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.last_insert_id())
    }

    pub async fn find_by_id(
        conn: &mut MySqlConnection,
        id: u64,
    ) -> Result<Option<ApprovalRequest>, sqlx::Error> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM approval_requests r WHERE r.id = ?");
        sqlx::query_as::<_, ApprovalRequest>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_id_for_update(
        conn: &mut MySqlConnection,
        id: u64,
    ) -> Result<Option<ApprovalRequest>, sqlx::Error> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM approval_requests r WHERE r.id = ? FOR UPDATE"
        );
        sqlx::query_as::<_, ApprovalRequest>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Attendance row a request points at, read without locking the request.
    pub async fn attendance_id_of(
        conn: &mut MySqlConnection,
        id: u64,
    ) -> Result<Option<u64>, sqlx::Error> {
        sqlx::query_scalar::<_, u64>("SELECT attendance_id FROM approval_requests WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Writes a planned transition. Guarded on the source state; `false`
    /// means another reviewer moved the request first.
    pub async fn apply_transition(
        conn: &mut MySqlConnection,
        id: u64,
        transition: &Transition,
        reviewer_user_id: u64,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let sql = match transition.tier {
            ReviewTier::Supervisor => {
                r#"
                UPDATE approval_requests
                SET status = ?, supervisor_reviewed_by = ?, supervisor_review_notes = ?,
                    supervisor_reviewed_at = ?, updated_at = ?
                WHERE id = ? AND status = ?
                "#
            }
            ReviewTier::Hr => {
                r#"
                UPDATE approval_requests
                SET status = ?, hr_reviewed_by = ?, hr_review_notes = ?,
                    hr_reviewed_at = ?, updated_at = ?
                WHERE id = ? AND status = ?
                "#
            }
        };

        let result = sqlx::query(sql)
            .bind(transition.to)
            .bind(reviewer_user_id)
            .bind(notes)
            .bind(now)
            .bind(now)
            .bind(id)
            .bind(transition.from)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Newest first. Returns the page and the total number of matching rows.
    pub async fn list(
        conn: &mut MySqlConnection,
        scope: RequestScope,
        filter: ListFilter,
    ) -> Result<(Vec<ApprovalRequest>, i64), sqlx::Error> {
        let (scope_sql, scope_binds) = scope_clause(scope);
        let status_sql = if filter.status.is_some() {
            " AND r.status = ?"
        } else {
            ""
        };
        let where_sql = format!("WHERE {scope_sql}{status_sql}");

        let count_sql = format!("SELECT COUNT(*) {REQUEST_FROM} {where_sql}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for value in &scope_binds {
            count_query = count_query.bind(*value);
        }
        if let Some(status) = filter.status {
            count_query = count_query.bind(status);
        }
        let total = count_query.fetch_one(&mut *conn).await?;

        let per_page = filter.per_page.max(1);
        let offset = u64::from(filter.page.max(1) - 1) * u64::from(per_page);
        let page_sql = format!(
            "SELECT {REQUEST_COLUMNS} {REQUEST_FROM} {where_sql} \
             ORDER BY r.created_at DESC, r.id DESC LIMIT ? OFFSET ?"
        );
        let mut page_query = sqlx::query_as::<_, ApprovalRequest>(&page_sql);
        for value in &scope_binds {
            page_query = page_query.bind(*value);
        }
        if let Some(status) = filter.status {
            page_query = page_query.bind(status);
        }
        let rows = page_query
            .bind(per_page)
            .bind(offset)
            .fetch_all(conn)
            .await?;

        Ok((rows, total))
    }

    pub async fn count_by_status(
        conn: &mut MySqlConnection,
        scope: RequestScope,
    ) -> Result<ApprovalStatusCounts, sqlx::Error> {
        let (scope_sql, scope_binds) = scope_clause(scope);
        let sql = format!(
            "SELECT r.status, COUNT(*) {REQUEST_FROM} WHERE {scope_sql} GROUP BY r.status"
        );
        let mut query = sqlx::query_as::<_, (ApprovalStatus, i64)>(&sql);
        for value in &scope_binds {
            query = query.bind(*value);
        }

        let mut counts = ApprovalStatusCounts::default();
        for (status, count) in query.fetch_all(conn).await? {
            counts.add(status, count);
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_clauses_bind_what_they_reference() {
        for scope in [
            RequestScope::All,
            RequestScope::UnitPending(4),
            RequestScope::Own(7),
            RequestScope::Nothing,
        ] {
            let (sql, binds) = scope_clause(scope);
            assert_eq!(sql.matches('?').count(), binds.len(), "{scope:?}");
        }
    }

    #[test]
    fn nothing_matches_no_rows() {
        assert_eq!(scope_clause(RequestScope::Nothing).0, "1 = 0");
    }
}
