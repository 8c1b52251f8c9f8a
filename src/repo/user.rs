use sqlx::{FromRow, MySqlConnection};

use crate::model::user::User;

#[derive(Debug, FromRow)]
pub struct RefreshTokenRow {
    pub id: u64,
    pub user_id: u64,
    pub revoked: bool,
}

/// Login accounts and their refresh-token ledger.
pub struct UserRepo;

impl UserRepo {
    pub async fn find_by_username(
        conn: &mut MySqlConnection,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, employee_id, is_active
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(conn)
        .await
    }

    pub async fn find_by_id(
        conn: &mut MySqlConnection,
        id: u64,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password, employee_id, is_active FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn touch_last_login(
        conn: &mut MySqlConnection,
        id: u64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn store_refresh_token(
        conn: &mut MySqlConnection,
        user_id: u64,
        jti: &str,
        expires_at: usize,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, jti, expires_at)
            VALUES (?, ?, FROM_UNIXTIME(?))
            "#,
        )
        .bind(user_id)
        .bind(jti)
        .bind(expires_at as i64)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn find_refresh_token_for_update(
        conn: &mut MySqlConnection,
        jti: &str,
    ) -> Result<Option<RefreshTokenRow>, sqlx::Error> {
        sqlx::query_as::<_, RefreshTokenRow>(
            "SELECT id, user_id, revoked FROM refresh_tokens WHERE jti = ? FOR UPDATE",
        )
        .bind(jti)
        .fetch_optional(conn)
        .await
    }

    pub async fn revoke_refresh_token(
        conn: &mut MySqlConnection,
        jti: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
            .bind(jti)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}
