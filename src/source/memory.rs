use crate::{
    entities::{ActiveUserRecord, RefreshEventRecord, UserId},
    error::{ChurnError, Result},
};

use super::{ActivitySource, SourceSnapshot};

/// Fixture source for exercising the pipeline without a database.
#[derive(Default)]
pub struct MemorySource {
    snapshot: SourceSnapshot,
    unreachable: bool,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn active(mut self, user_id: impl Into<UserId>) -> Self {
        self.snapshot.active_users.push(ActiveUserRecord {
            user_id: user_id.into(),
        });
        self
    }

    pub fn event(mut self, user_id: impl Into<UserId>, last_used_date: Option<&str>) -> Self {
        self.snapshot.refresh_events.push(RefreshEventRecord {
            user_id: user_id.into(),
            last_used_date: last_used_date.map(str::to_owned),
        });
        self
    }
}

impl ActivitySource for MemorySource {
    async fn load(&self) -> Result<SourceSnapshot> {
        if self.unreachable {
            return Err(ChurnError::Connection("connection refused".to_owned()));
        }

        Ok(self.snapshot.clone())
    }
}
