//! Grouping of a flat change log into per-author comments.
//!
//! A ticket's history is stored one row per field mutation. Everything one
//! author did to one ticket within the same second is presented as a single
//! comment: a list of changed fields plus the optional free-text note.

use serde::Serialize;

use crate::model::Change;
use crate::text::{capitalize, change_format};
use crate::time::iso_date;

/// A changed field inside a [`Comment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedField {
    #[serde(flatten)]
    pub change: Change,
    /// Field name with its first letter uppercased, for display.
    pub field_title: String,
    /// HTML summary produced by [`change_format`].
    pub summary_html: String,
}

impl ChangedField {
    fn new(change: Change) -> Self {
        let field_title = capitalize(&change.field);
        let summary_html = change_format(&change);
        Self {
            change,
            field_title,
            summary_html,
        }
    }
}

/// Changes made by one author to one ticket within one second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    /// Whole-second timestamp in milliseconds.
    pub time: i64,
    /// UTC calendar date of `time`.
    pub date: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<u64>,
    /// Non-comment field changes, ordered by field name descending.
    pub changed: Vec<ChangedField>,
    /// Comment number, taken from the `comment` change's old value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnum: Option<String>,
    /// Comment body, taken from the `comment` change's new value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Whether `changed` is non-empty. Maintained by [`group_comments`].
    pub has_changes: bool,
}

impl Comment {
    fn open(change: &Change, time: i64) -> Self {
        Self {
            time,
            date: iso_date(time),
            author: change.author.clone(),
            ticket: change.ticket,
            changed: Vec::new(),
            cnum: None,
            comment: None,
            has_changes: false,
        }
    }

    fn starts_new(&self, change: &Change, time: i64) -> bool {
        time > self.time || self.author != change.author || self.ticket != change.ticket
    }
}

/// Truncate a millisecond timestamp to whole seconds.
#[must_use]
pub const fn truncate_to_second(millis: i64) -> i64 {
    millis.div_euclid(1000) * 1000
}

/// Fold a change log into comments, preserving input order.
///
/// A new comment starts when the author or ticket differs from the current
/// one, or when the change's second is later than the current comment's. A
/// change to the pseudo-field `comment` supplies the comment number and body
/// instead of becoming a changed field.
#[must_use]
pub fn group_comments(changes: impl IntoIterator<Item = Change>) -> Vec<Comment> {
    let mut comments: Vec<Comment> = Vec::new();

    for change in changes {
        let time = truncate_to_second(change.time);
        let needs_new = comments
            .last()
            .is_none_or(|current| current.starts_new(&change, time));
        if needs_new {
            comments.push(Comment::open(&change, time));
        }
        let Some(current) = comments.last_mut() else {
            continue;
        };

        if change.field == "comment" {
            current.cnum = change.oldvalue;
            current.comment = change.newvalue;
        } else {
            current.changed.push(ChangedField::new(change));
        }
    }

    for comment in &mut comments {
        comment
            .changed
            .sort_by(|a, b| b.change.field.cmp(&a.change.field));
        comment.has_changes = !comment.changed.is_empty();
    }

    tracing::debug!(comments = comments.len(), "grouped change log");
    comments
}
