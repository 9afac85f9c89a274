//! Per-user rolling daily generation limit.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::store::WorkoutStore;

/// Workouts a non-admin user may generate per rolling window.
pub const DAILY_GENERATION_LIMIT: i64 = 100;

/// Length of the rolling window.
pub fn quota_window() -> Duration {
    Duration::hours(24)
}

/// A user's standing against the limit at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    pub used: i64,
    pub limit: i64,
    /// Administrators are never limited.
    pub exempt: bool,
    /// Exclusive start of the window; its end is the `now` passed in.
    pub window_start: DateTime<Utc>,
}

impl QuotaStatus {
    pub fn is_exhausted(&self) -> bool {
        !self.exempt && self.used >= self.limit
    }

    /// Generations left in the window, or `None` for exempt users.
    pub fn remaining(&self) -> Option<i64> {
        (!self.exempt).then(|| (self.limit - self.used).max(0))
    }
}

/// Count `user_id`'s workouts in `(now - 24h, now]`.
pub async fn check_quota(
    store: &dyn WorkoutStore,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<QuotaStatus> {
    let window_start = now - quota_window();
    let exempt = store.is_admin(user_id).await?;
    let used = store.count_workouts_since(user_id, window_start, now).await?;

    debug!(user_id = %user_id, used, exempt, "quota checked");

    Ok(QuotaStatus {
        used,
        limit: DAILY_GENERATION_LIMIT,
        exempt,
        window_start,
    })
}
