use sqlx::MySqlPool;
use tracing::info;

use crate::engine::policy::ensure_no_other_active;
use crate::engine::workflow::can_review_as_hr;
use crate::error::{AttendanceError, AttendanceResult};
use crate::model::employee::Actor;
use crate::model::holiday::Holiday;
use crate::model::time_policy::{NewTimePolicy, TimePolicy};
use crate::repo::policy::PolicyRepo;

fn require_hr(actor: &Actor) -> AttendanceResult<()> {
    if can_review_as_hr(actor) {
        Ok(())
    } else {
        Err(AttendanceError::Unauthorized(
            "Only HR admins can manage time policies".into(),
        ))
    }
}

/// Governing policy plus the active holiday calendar.
pub async fn current(pool: &MySqlPool) -> AttendanceResult<(TimePolicy, Vec<Holiday>)> {
    let mut tx = pool.begin().await?;
    let policy = PolicyRepo::current(&mut tx).await?;
    let holidays = PolicyRepo::active_holidays(&mut tx).await?;
    tx.commit().await?;
    Ok((policy, holidays))
}

/// Stores a new policy. An active one is refused while another is active.
pub async fn create(
    pool: &MySqlPool,
    actor: &Actor,
    new: NewTimePolicy,
) -> AttendanceResult<TimePolicy> {
    require_hr(actor)?;
    new.validate()?;

    let mut tx = pool.begin().await?;
    if new.is_active {
        let active = PolicyRepo::active_id_for_update(&mut tx).await?;
        ensure_no_other_active(active, None)?;
    }
    let id = PolicyRepo::insert(&mut tx, &new).await?;
    let policy = PolicyRepo::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| AttendanceError::not_found("time policy", id))?;
    tx.commit().await?;

    info!(policy_id = id, is_active = policy.is_active, created_by = actor.user_id, "Time policy created");
    Ok(policy)
}

/// Makes `id` the single active policy.
pub async fn activate(pool: &MySqlPool, actor: &Actor, id: u64) -> AttendanceResult<TimePolicy> {
    require_hr(actor)?;

    let mut tx = pool.begin().await?;
    let previous = PolicyRepo::active_id_for_update(&mut tx).await?;
    if PolicyRepo::find_by_id(&mut tx, id).await?.is_none() {
        return Err(AttendanceError::not_found("time policy", id));
    }
    PolicyRepo::activate(&mut tx, id).await?;
    let policy = PolicyRepo::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| AttendanceError::not_found("time policy", id))?;
    tx.commit().await?;

    info!(policy_id = id, ?previous, activated_by = actor.user_id, "Time policy activated");
    Ok(policy)
}
