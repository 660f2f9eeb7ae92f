//! Cross-ticket activity bucketed by calendar day.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::changes::group_comments;
use crate::model::{Change, Extra};

use super::ViewContext;
use super::ticket::RenderedComment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDocument {
    /// Change log, oldest first.
    #[serde(default)]
    pub changes: Vec<Change>,
    /// Tickets referenced by `changes`, keyed by ticket id.
    #[serde(default)]
    pub tickets: BTreeMap<String, TicketSummary>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub comment: RenderedComment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub status_class: &'static str,
}

/// Entries sharing one UTC calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Day {
    pub date: String,
    /// `"Today"` or `"Yesterday"` relative to the view's clock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today_or_yesterday: Option<&'static str>,
    pub day_changes: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineView {
    #[serde(flatten)]
    pub document: TimelineDocument,
    pub days: Vec<Day>,
}

fn label_for(date: &str, ctx: &ViewContext) -> Option<&'static str> {
    if date == ctx.today() {
        Some("Today")
    } else if date == ctx.yesterday() {
        Some("Yesterday")
    } else {
        None
    }
}

/// Bucket comments into days, newest first.
///
/// Comments are walked from last to first; a new day opens whenever the
/// date differs from the current day's.
#[must_use]
pub fn day_groups(
    comments: Vec<RenderedComment>,
    tickets: &BTreeMap<String, TicketSummary>,
    ctx: &ViewContext,
) -> Vec<Day> {
    let mut days: Vec<Day> = Vec::new();
    for comment in comments.into_iter().rev() {
        let summary = comment
            .comment
            .ticket
            .and_then(|id| tickets.get(&id.to_string()))
            .and_then(|t| t.summary.clone());
        let date = comment.comment.date.clone();
        let entry = TimelineEntry {
            comment,
            summary,
            status_class: "newticket",
        };
        match days.last_mut() {
            Some(day) if day.date == date => day.day_changes.push(entry),
            _ => days.push(Day {
                today_or_yesterday: label_for(&date, ctx),
                date,
                day_changes: vec![entry],
            }),
        }
    }
    days
}

#[must_use]
pub fn transform(document: TimelineDocument, ctx: &ViewContext) -> TimelineView {
    let comments = group_comments(document.changes.iter().cloned())
        .into_iter()
        .map(|comment| RenderedComment::new(comment, ctx))
        .collect();
    let days = day_groups(comments, &document.tickets, ctx);
    tracing::debug!(days = days.len(), "bucketed timeline");
    TimelineView { document, days }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    const HOUR: i64 = 3_600_000;

    fn at(y: i32, m: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
            .single()
            .expect("valid timestamp")
            .timestamp_millis()
    }

    fn ctx() -> ViewContext {
        let now = Utc
            .with_ymd_and_hms(2024, 6, 15, 18, 0, 0)
            .single()
            .expect("valid timestamp");
        ViewContext::new(&now, ViewConfig::default())
    }

    fn document() -> TimelineDocument {
        serde_json::from_value(json!({
            "template": "timeline",
            "title": "Timeline",
            "tickets": {
                "1": {"summary": "Login broken"},
                "2": {"summary": "Slow search"}
            },
            "changes": [
                {"time": at(2024, 6, 10, 9), "author": "a", "ticket": 1, "field": "status", "oldvalue": "new", "newvalue": "assigned"},
                {"time": at(2024, 6, 14, 9), "author": "a", "ticket": 1, "field": "status", "oldvalue": "assigned", "newvalue": "closed"},
                {"time": at(2024, 6, 15, 8), "author": "b", "ticket": 2, "field": "comment", "oldvalue": "1", "newvalue": "looking"},
                {"time": at(2024, 6, 15, 8) + HOUR, "author": "b", "ticket": 3, "field": "priority", "oldvalue": "low", "newvalue": "high"}
            ]
        }))
        .expect("timeline decodes")
    }

    #[test]
    fn days_are_newest_first_with_labels() {
        let view = transform(document(), &ctx());
        let dates: Vec<&str> = view.days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-06-15", "2024-06-14", "2024-06-10"]);
        assert_eq!(view.days[0].today_or_yesterday, Some("Today"));
        assert_eq!(view.days[1].today_or_yesterday, Some("Yesterday"));
        assert_eq!(view.days[2].today_or_yesterday, None);
    }

    #[test]
    fn entries_within_a_day_are_reversed_input_order() {
        let view = transform(document(), &ctx());
        let today = &view.days[0].day_changes;
        assert_eq!(today.len(), 2);
        assert_eq!(today[0].comment.comment.ticket, Some(3));
        assert_eq!(today[1].comment.comment.ticket, Some(2));
    }

    #[test]
    fn entries_are_aged_against_view_clock() {
        let view = transform(document(), &ctx());
        let ages: Vec<&str> = view
            .days
            .iter()
            .flat_map(|day| &day.day_changes)
            .map(|entry| entry.comment.ago.as_str())
            .collect();
        assert_eq!(
            ages,
            vec!["9 hours ago", "10 hours ago", "33 hours ago", "5 days ago"]
        );
    }

    #[test]
    fn entries_carry_ticket_summary() {
        let view = transform(document(), &ctx());
        let today = &view.days[0].day_changes;
        assert_eq!(today[0].summary, None);
        assert_eq!(today[1].summary.as_deref(), Some("Slow search"));
        assert_eq!(today[1].status_class, "newticket");
        assert_eq!(
            view.days[1].day_changes[0].summary.as_deref(),
            Some("Login broken")
        );
    }

    #[test]
    fn empty_change_log_has_no_days() {
        let document: TimelineDocument =
            serde_json::from_value(json!({"title": "Timeline"})).expect("decode");
        assert!(transform(document, &ctx()).days.is_empty());
    }
}
