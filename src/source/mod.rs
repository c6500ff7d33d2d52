#[cfg(test)]
pub mod memory;
pub mod postgres;

use crate::{
    entities::{ActiveUserRecord, RefreshEventRecord},
    error::Result,
};

/// Raw rows of one run, as fetched.
#[derive(Debug, Clone, Default)]
pub struct SourceSnapshot {
    pub refresh_events: Vec<RefreshEventRecord>,
    pub active_users: Vec<ActiveUserRecord>,
}

pub(crate) trait ActivitySource {
    async fn load(&self) -> Result<SourceSnapshot>;
}
