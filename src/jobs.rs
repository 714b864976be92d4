//! Background jobs.

use crate::repository::CampaignRepository;
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// Close expired campaigns every `period` (at least one second), starting immediately.
/// Errors are logged and the loop continues.
pub async fn run_expiry_sweep(pool: PgPool, period: Duration) {
    let mut ticker = interval(period.max(Duration::from_secs(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match CampaignRepository::new(&pool).close_expired().await {
            Ok(0) => tracing::debug!("expiry sweep: nothing to close"),
            Ok(n) => tracing::info!(closed = n, "expiry sweep closed campaigns"),
            Err(e) => tracing::error!(error = %e, "expiry sweep failed"),
        }
    }
}
