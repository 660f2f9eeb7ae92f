//! Single ticket page: change history grouped into comments.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::changes::{Comment, group_comments};
use crate::model::{Change, Extra, display_value};
use crate::text::wiki_format;
use crate::time::ago_format;

use super::ViewContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketDocument {
    pub ticket: TicketRecord,
    #[serde(flatten)]
    pub extra: Extra,
}

impl TicketDocument {
    /// `#<id> <summary>`.
    #[must_use]
    pub fn title(&self) -> String {
        format!(
            "#{} {}",
            display_value(Some(&self.ticket.id)),
            self.ticket.summary
        )
    }
}

/// A comment with its body rendered to HTML and its age spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedComment {
    #[serde(flatten)]
    pub comment: Comment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_html: Option<String>,
    /// `time` relative to the view's clock, e.g. `"3 days ago"`.
    pub ago: String,
}

impl RenderedComment {
    pub(crate) fn new(comment: Comment, ctx: &ViewContext) -> Self {
        let comment_html = comment
            .comment
            .as_deref()
            .filter(|body| !body.is_empty())
            .map(|body| wiki_format(ctx.wiki(), body));
        Self {
            ago: ago_format(comment.time, ctx.now_millis()),
            comment,
            comment_html,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketView {
    #[serde(flatten)]
    pub record: TicketRecord,
    pub comments: Vec<RenderedComment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketPageView {
    pub ticket: TicketView,
    #[serde(flatten)]
    pub extra: Extra,
}

#[must_use]
pub fn transform(document: TicketDocument, ctx: &ViewContext) -> TicketPageView {
    let record = document.ticket;
    let comments = group_comments(record.changes.iter().cloned())
        .into_iter()
        .map(|comment| RenderedComment::new(comment, ctx))
        .collect();
    let description_html = record
        .description
        .as_deref()
        .map(|text| wiki_format(ctx.wiki(), text));
    TicketPageView {
        ticket: TicketView {
            record,
            comments,
            description_html,
        },
        extra: document.extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::text::WikiRenderer;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    struct Verbatim;

    impl WikiRenderer for Verbatim {
        fn render(&self, text: &str) -> String {
            format!("<p>{text}</p>")
        }
    }

    fn ctx() -> ViewContext {
        let now = Utc
            .with_ymd_and_hms(2024, 6, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        ViewContext::new(&now, ViewConfig::default()).with_wiki(Verbatim)
    }

    fn document() -> TicketDocument {
        serde_json::from_value(json!({
            "template": "ticket",
            "title": "Ticket",
            "ticket": {
                "id": 42,
                "summary": "Crash on save",
                "description": "Steps in #41",
                "status": "assigned",
                "changes": [
                    {"time": 1000, "author": "a", "field": "status", "oldvalue": "new", "newvalue": "assigned"},
                    {"time": 1000, "author": "a", "field": "comment", "oldvalue": "1", "newvalue": "dup of #7"},
                    {"time": 9000, "author": "b", "field": "comment", "oldvalue": "2", "newvalue": ""}
                ]
            }
        }))
        .expect("ticket decodes")
    }

    #[test]
    fn title_is_hash_id_and_summary() {
        assert_eq!(document().title(), "#42 Crash on save");
    }

    #[test]
    fn changes_become_comments() {
        let view = transform(document(), &ctx());
        let comments = &view.ticket.comments;
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].comment.cnum.as_deref(), Some("1"));
        assert_eq!(
            comments[0].comment_html.as_deref(),
            Some("<p>dup of <a href=\"/ticket/7\">#7</a></p>")
        );
        assert!(comments[0].comment.has_changes);
        assert_eq!(comments[1].comment_html, None);
        assert!(!comments[1].comment.has_changes);
    }

    #[test]
    fn comments_carry_age_against_view_clock() {
        let ctx = ctx();
        let mut doc = document();
        let recent = ctx.now_millis() - 3 * 86_400_000;
        for change in &mut doc.ticket.changes {
            change.time = recent;
        }
        let view = transform(doc, &ctx);
        assert_eq!(view.ticket.comments[0].ago, "3 days ago");

        let model = serde_json::to_value(transform(document(), &ctx)).expect("serialize");
        assert_eq!(model["ticket"]["comments"][1]["ago"], "54 years ago");
    }

    #[test]
    fn description_is_wiki_formatted() {
        let view = transform(document(), &ctx());
        assert_eq!(
            view.ticket.description_html.as_deref(),
            Some("<p>Steps in <a href=\"/ticket/41\">#41</a></p>")
        );
    }

    #[test]
    fn model_keeps_ticket_fields() {
        let model = serde_json::to_value(transform(document(), &ctx())).expect("serialize");
        assert_eq!(model["title"], "Ticket");
        assert_eq!(model["ticket"]["status"], "assigned");
        assert_eq!(model["ticket"]["comments"][0]["changed"][0]["field_title"], "Status");
        assert_eq!(model["ticket"]["comments"][0]["has_changes"], true);
    }
}
