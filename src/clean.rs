use std::collections::{btree_map::Entry, BTreeMap, HashSet};

use time::OffsetDateTime;

use crate::{
    entities::{ActiveUserRecord, CleanStats, RefreshEventRecord, UnifiedActivityRecord, UserId},
    timestamp::{self, TimestampParsing},
};

#[derive(Debug, Clone)]
pub struct Cleaned {
    pub records: Vec<UnifiedActivityRecord>,
    pub stats: CleanStats,
}

/// Joins refresh events onto active users and keeps each user's latest
/// parseable activity. Output is ordered by user id.
pub fn clean(
    refresh_events: &[RefreshEventRecord],
    active_users: &[ActiveUserRecord],
    parsing: TimestampParsing,
) -> Cleaned {
    let active: HashSet<&UserId> = active_users.iter().map(|user| &user.user_id).collect();
    let mut latest: BTreeMap<&UserId, OffsetDateTime> = BTreeMap::new();

    let mut stats = CleanStats {
        refresh_events: refresh_events.len(),
        active_users: active.len(),
        ..Default::default()
    };

    for event in refresh_events {
        let last_used = event
            .last_used_date
            .as_deref()
            .and_then(|value| timestamp::parse(value, parsing));

        if !active.contains(&event.user_id) {
            stats.unmatched_events += 1;
            continue;
        }

        let Some(last_used) = last_used else {
            stats.unparseable_timestamps += 1;
            continue;
        };

        match latest.entry(&event.user_id) {
            Entry::Vacant(entry) => {
                entry.insert(last_used);
            }
            Entry::Occupied(mut entry) => {
                stats.superseded_events += 1;
                if last_used > *entry.get() {
                    entry.insert(last_used);
                }
            }
        }
    }

    let records: Vec<UnifiedActivityRecord> = latest
        .into_iter()
        .map(|(user_id, last_used_date)| UnifiedActivityRecord {
            user_id: user_id.clone(),
            last_used_date,
        })
        .collect();

    stats.unified_records = records.len();

    if stats.unparseable_timestamps > 0 {
        tracing::info!(
            dropped = stats.unparseable_timestamps,
            ?parsing,
            "dropped refresh events without a parseable LastUsedDate"
        );
    }

    tracing::debug!(
        refresh_events = stats.refresh_events,
        active_users = stats.active_users,
        unmatched_events = stats.unmatched_events,
        superseded_events = stats.superseded_events,
        unified_records = stats.unified_records,
        "cleaned activity"
    );

    Cleaned { records, stats }
}
