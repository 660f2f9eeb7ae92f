//! Milestone list with progress bars and due-date wording.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::model::{Extra, opt_millis};
use crate::time::{elapsed_time, iso_date};

use super::ViewContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    /// Due date in milliseconds; `null` or `0` means no due date.
    #[serde(default, deserialize_with = "opt_millis", skip_serializing_if = "Option::is_none")]
    pub due: Option<i64>,
    #[serde(default)]
    pub closed: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneListDocument {
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A milestone annotated for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneEntry {
    #[serde(flatten)]
    pub milestone: Milestone,
    pub pct_closed: u64,
    /// Always `100 - pct_closed`, so the two bars fill exactly.
    pub pct_open: u64,
    /// Query-string safe name, spaces as `+`.
    pub qname: String,
    /// Milliseconds from now until due; negative when late.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<i64>,
    pub due_ago: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneListView {
    pub milestones: Vec<MilestoneEntry>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// `round(100 * closed / total)` in integer arithmetic, half rounding up.
/// An empty milestone counts as 0% closed.
#[must_use]
pub fn percent_closed(closed: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let closed = u128::from(closed.min(total));
    let total = u128::from(total);
    let pct = (200 * closed + total) / (2 * total);
    u64::try_from(pct).unwrap_or(100)
}

/// Query-string encoding of a milestone name.
#[must_use]
pub fn query_name(name: &str) -> String {
    form_urlencoded::byte_serialize(name.as_bytes()).collect()
}

/// Due-date wording relative to `now_millis`.
#[must_use]
pub fn due_format(due: Option<i64>, now_millis: i64) -> String {
    let Some(due) = due else {
        return "No date set".to_string();
    };
    let elapsed = due.saturating_sub(now_millis);
    let date = iso_date(due);
    if elapsed < 0 {
        format!("<strong>{} late </strong> ({date})", elapsed_time(elapsed))
    } else {
        format!("Due in {} ({date})", elapsed_time(elapsed))
    }
}

fn entry(milestone: Milestone, now_millis: i64) -> MilestoneEntry {
    let pct_closed = percent_closed(milestone.closed, milestone.total);
    MilestoneEntry {
        pct_open: 100 - pct_closed,
        pct_closed,
        qname: query_name(&milestone.name),
        elapsed: milestone.due.map(|due| due.saturating_sub(now_millis)),
        due_ago: due_format(milestone.due, now_millis),
        milestone,
    }
}

#[must_use]
pub fn transform(document: MilestoneListDocument, ctx: &ViewContext) -> MilestoneListView {
    let now = ctx.now_millis();
    MilestoneListView {
        milestones: document
            .milestones
            .into_iter()
            .map(|m| entry(m, now))
            .collect(),
        extra: document.extra,
    }
}
