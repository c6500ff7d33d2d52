use std::{collections::BTreeSet, fmt::Write};

use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::entities::{ChurnReport, UserId, UserStatus};

pub fn status_line(user_id: &UserId, status: UserStatus) -> String {
    match status {
        UserStatus::Active => format!("The user {user_id} is in Active status."),
        UserStatus::Inactive => format!("The user {user_id} is in Inactive status."),
        UserStatus::NotFound => format!("No such user found. ID {user_id} not found."),
    }
}

fn rfc3339(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

fn id_list(ids: &BTreeSet<UserId>) -> String {
    ids.iter().map(UserId::to_string).collect::<Vec<_>>().join(", ")
}

pub fn render_text(report: &ChurnReport, list_users: bool) -> String {
    let result = &report.result;
    let mut out = String::new();

    // writing to a String cannot fail
    let _ = writeln!(out, "Churn rate: {:.2}%", result.churn_rate);
    let _ = writeln!(out, "Total users: {}", result.total_users);
    let _ = writeln!(out, "Active users: {}", result.active_users);
    let _ = writeln!(out, "Inactive users: {}", result.inactive_users);
    let _ = writeln!(
        out,
        "Window: {} days (cutoff {}, latest activity {})",
        result.window_days,
        rfc3339(result.cutoff),
        rfc3339(result.latest_activity)
    );

    if list_users {
        let _ = writeln!(out, "Active user ids: {}", id_list(&result.active_user_ids));
        let _ = writeln!(out, "Inactive user ids: {}", id_list(&result.inactive_user_ids));
    }

    if let (Some(target), Some(status)) = (&report.target, report.status) {
        let _ = writeln!(out, "{}", status_line(target, status));
    }

    out
}

pub fn render_json(report: &ChurnReport, list_users: bool) -> serde_json::Result<String> {
    let mut value = serde_json::to_value(report)?;

    if !list_users {
        if let Some(result) = value.get_mut("result").and_then(|r| r.as_object_mut()) {
            result.remove("activeUserIds");
            result.remove("inactiveUserIds");
        }
    }

    serde_json::to_string_pretty(&value)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::entities::{ChurnResult, CleanStats};

    fn report(target: Option<UserId>, status: Option<UserStatus>) -> ChurnReport {
        ChurnReport {
            result: ChurnResult {
                churn_rate: 33.33,
                total_users: 3,
                inactive_users: 1,
                active_users: 2,
                window_days: 90,
                latest_activity: datetime!(2024-06-01 12:00:00 UTC),
                cutoff: datetime!(2024-03-03 12:00:00 UTC),
                active_user_ids: [UserId::from(1), UserId::from(2)].into(),
                inactive_user_ids: [UserId::from(3)].into(),
            },
            target,
            status,
            clean: CleanStats::default(),
        }
    }

    #[test]
    fn test_status_lines() {
        let id = UserId::from(123456789);

        assert_eq!(status_line(&id, UserStatus::Active), "The user 123456789 is in Active status.");
        assert_eq!(
            status_line(&id, UserStatus::Inactive),
            "The user 123456789 is in Inactive status."
        );
        assert_eq!(
            status_line(&id, UserStatus::NotFound),
            "No such user found. ID 123456789 not found."
        );
    }

    #[test]
    fn test_text_summary() {
        let text = render_text(&report(Some(UserId::from(3)), Some(UserStatus::Inactive)), false);

        assert!(text.contains("Churn rate: 33.33%"));
        assert!(text.contains("Total users: 3"));
        assert!(text.contains("cutoff 2024-03-03T12:00:00Z"));
        assert!(text.ends_with("The user 3 is in Inactive status.\n"));
        assert!(!text.contains("user ids"));
    }

    #[test]
    fn test_text_lists_users_on_request() {
        let text = render_text(&report(None, None), true);

        assert!(text.contains("Active user ids: 1, 2\n"));
        assert!(text.contains("Inactive user ids: 3\n"));
    }

    #[test]
    fn test_json_omits_ids_unless_requested() {
        let compact: serde_json::Value =
            serde_json::from_str(&render_json(&report(None, None), false).unwrap()).unwrap();
        assert_eq!(compact["result"]["churnRate"], 33.33);
        assert_eq!(compact["result"]["cutoff"], "2024-03-03T12:00:00Z");
        assert!(compact["result"].get("activeUserIds").is_none());

        let full: serde_json::Value =
            serde_json::from_str(&render_json(&report(Some(UserId::from(1)), Some(UserStatus::Active)), true).unwrap())
                .unwrap();
        assert_eq!(full["result"]["activeUserIds"], serde_json::json!([1, 2]));
        assert_eq!(full["status"], "Active");
        assert_eq!(full["target"], 1);
    }
}
