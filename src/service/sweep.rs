use std::time::Duration;

use chrono::{Local, NaiveDateTime, Utc};
use sqlx::MySqlPool;
use tracing::{debug, error, info};

use crate::engine::sweep::{missed_clock_out, sweep_cutoff};
use crate::error::AttendanceResult;
use crate::repo::attendance::AttendanceRepo;
use crate::repo::policy::PolicyRepo;

/// Re-marks PRESENT days left without a clock-out as ABSENT once their
/// deadline has passed. No-op unless the active policy enforces clock-outs.
pub async fn run_sweep(pool: &MySqlPool, now: NaiveDateTime) -> AttendanceResult<u64> {
    let mut tx = pool.begin().await?;

    let policy = PolicyRepo::current(&mut tx).await?;
    let Some(cutoff) = sweep_cutoff(&policy, now) else {
        debug!(policy_id = policy.id, "Clock-out sweep disabled by policy");
        return Ok(0);
    };

    let ids: Vec<u64> = AttendanceRepo::open_days_for_update(&mut tx, cutoff)
        .await?
        .iter()
        .filter(|r| missed_clock_out(r))
        .map(|r| r.id)
        .collect();
    let updated = AttendanceRepo::mark_absent(&mut tx, &ids, Utc::now()).await?;
    tx.commit().await?;

    if updated > 0 {
        info!(cutoff = %cutoff, updated, "Missing clock-outs marked absent");
    }
    Ok(updated)
}

/// Runs the sweep every `interval` until the runtime shuts down.
pub async fn sweep_loop(pool: MySqlPool, interval: Duration) {
    let mut ticker = actix_web::rt::time::interval(interval);
    loop {
        ticker.tick().await;
        if let Err(e) = run_sweep(&pool, Local::now().naive_local()).await {
            error!(error = %e, "Clock-out sweep failed");
        }
    }
}
