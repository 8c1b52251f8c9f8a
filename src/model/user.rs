use sqlx::FromRow;

/// Login row; `employee_id` links the account to an employee profile.
#[derive(Debug, FromRow)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub employee_id: Option<u64>,
    pub is_active: bool,
}
