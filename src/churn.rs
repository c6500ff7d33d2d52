//! Churn classification and per-user status lookup.
//!
//! The cutoff is anchored on the most recent activity in the data set, not on
//! the wall clock, so a stale snapshot still yields a meaningful partition.

use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

use time::{Duration, OffsetDateTime};

use crate::{
    entities::{ChurnResult, UnifiedActivityRecord, UserId, UserStatus},
    error::{ChurnError, Result},
};

/// Partitions users into active (`last_used >= cutoff`) and inactive
/// (`last_used < cutoff`), where `cutoff = max(last_used) - days`.
pub fn classify(records: &[UnifiedActivityRecord], days: u32) -> Result<ChurnResult> {
    if days == 0 {
        return Err(ChurnError::InvalidWindow(days));
    }

    let mut latest: BTreeMap<&UserId, OffsetDateTime> = BTreeMap::new();

    for record in records {
        match latest.entry(&record.user_id) {
            Entry::Vacant(entry) => {
                entry.insert(record.last_used_date);
            }
            Entry::Occupied(mut entry) => {
                if record.last_used_date > *entry.get() {
                    entry.insert(record.last_used_date);
                }
            }
        }
    }

    let latest_activity = latest.values().max().copied().ok_or(ChurnError::EmptyDataset)?;
    let cutoff = latest_activity
        .checked_sub(Duration::days(days.into()))
        .ok_or(ChurnError::InvalidWindow(days))?;

    let (inactive, active): (Vec<_>, Vec<_>) = latest
        .into_iter()
        .partition(|(_, last_used)| *last_used < cutoff);

    let inactive_user_ids: BTreeSet<UserId> = inactive.into_iter().map(|(id, _)| id.clone()).collect();
    let active_user_ids: BTreeSet<UserId> = active.into_iter().map(|(id, _)| id.clone()).collect();

    let total_users = inactive_user_ids.len() + active_user_ids.len();
    let inactive_users = inactive_user_ids.len();

    let result = ChurnResult {
        churn_rate: churn_rate(inactive_users, total_users),
        total_users,
        inactive_users,
        active_users: total_users - inactive_users,
        window_days: days,
        latest_activity,
        cutoff,
        active_user_ids,
        inactive_user_ids,
    };

    tracing::info!(
        churn_rate = result.churn_rate,
        total_users = result.total_users,
        inactive_users = result.inactive_users,
        cutoff = %result.cutoff,
        "classified users"
    );

    Ok(result)
}

fn churn_rate(inactive_users: usize, total_users: usize) -> f64 {
    let percent = inactive_users as f64 / total_users as f64 * 100.0;
    (percent * 100.0).round_ties_even() / 100.0
}

impl ChurnResult {
    pub fn status(&self, user_id: &UserId) -> UserStatus {
        if self.active_user_ids.contains(user_id) {
            UserStatus::Active
        } else if self.inactive_user_ids.contains(user_id) {
            UserStatus::Inactive
        } else {
            UserStatus::NotFound
        }
    }
}
