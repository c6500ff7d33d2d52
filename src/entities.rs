use std::{collections::BTreeSet, convert::Infallible, fmt, str::FromStr};

use serde::Serialize;
use time::OffsetDateTime;

/// User identifier as stored in either source table.
///
/// Text that parses as an integer normalizes to `Int`, so `"123"` from a
/// varchar column and `123` from an int8 column are the same user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum UserId {
    Int(i64),
    Text(String),
}

impl UserId {
    /// Only canonical integer text becomes `Int`; `"007"`, `"+7"` and
    /// `" 7"` stay distinct text ids.
    pub fn parse(value: &str) -> UserId {
        match value.parse::<i64>() {
            Ok(id) if id.to_string() == value => UserId::Int(id),
            _ => UserId::Text(value.to_owned()),
        }
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId::Int(id)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        UserId::Int(id.into())
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        UserId::parse(value)
    }
}

impl FromStr for UserId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(UserId::parse(s))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Int(id) => write!(f, "{id}"),
            UserId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUserRecord {
    pub user_id: UserId,
}

/// One refresh-token usage, reduced to the columns churn needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshEventRecord {
    pub user_id: UserId,
    pub last_used_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedActivityRecord {
    pub user_id: UserId,
    pub last_used_date: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnResult {
    pub churn_rate: f64,
    pub total_users: usize,
    pub inactive_users: usize,
    pub active_users: usize,
    pub window_days: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub latest_activity: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub cutoff: OffsetDateTime,
    pub active_user_ids: BTreeSet<UserId>,
    pub inactive_user_ids: BTreeSet<UserId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UserStatus {
    Active,
    Inactive,
    NotFound,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanStats {
    pub refresh_events: usize,
    pub active_users: usize,
    pub unparseable_timestamps: usize,
    pub unmatched_events: usize,
    pub superseded_events: usize,
    pub unified_records: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnReport {
    pub result: ChurnResult,
    pub target: Option<UserId>,
    pub status: Option<UserStatus>,
    pub clean: CleanStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_text_normalizes() {
        assert_eq!(UserId::parse("123456789"), UserId::Int(123456789));
        assert_eq!(UserId::parse("-42"), UserId::from(-42));
        assert_eq!(UserId::parse("007"), UserId::Text("007".to_owned()));
        assert_eq!(UserId::parse("+7"), UserId::Text("+7".to_owned()));
        assert_eq!(UserId::parse(" 7 "), UserId::Text(" 7 ".to_owned()));
        assert_eq!(
            UserId::parse("c0ffee00-0000-4000-8000-000000000001"),
            UserId::Text("c0ffee00-0000-4000-8000-000000000001".to_owned())
        );
    }

    #[test]
    fn test_ordering_is_numeric_then_text() {
        let mut ids = vec![UserId::parse("b"), UserId::from(10), UserId::from(9), UserId::parse("a")];
        ids.sort();

        assert_eq!(
            ids,
            vec![UserId::from(9), UserId::from(10), UserId::parse("a"), UserId::parse("b")]
        );
    }

    #[test]
    fn test_serialize_untagged() {
        let ids = vec![UserId::from(7), UserId::parse("abc")];
        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"[7,"abc"]"#);
    }
}
