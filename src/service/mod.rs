//! Transactional use-cases. Each public function owns one transaction, runs
//! the pure engine rules against rows locked inside it and persists the
//! outcome before commit.

pub mod approval;
pub mod attendance;
pub mod policy;
pub mod sweep;

use sqlx::MySqlPool;

use crate::error::{AttendanceError, AttendanceResult};
use crate::model::employee::Actor;
use crate::repo::employee::EmployeeRepo;

/// Loads the review authority of an authenticated user.
pub async fn load_actor(pool: &MySqlPool, user_id: u64) -> AttendanceResult<Actor> {
    let mut conn = pool.acquire().await?;
    EmployeeRepo::actor_for_user(&mut conn, user_id)
        .await?
        .ok_or_else(|| AttendanceError::Unauthorized("Account is inactive or unknown".into()))
}
