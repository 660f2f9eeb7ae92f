//! HTML-producing text helpers: escaping, ticket linking, wiki formatting,
//! and one-line summaries of field changes.

use std::collections::HashSet;
use std::sync::LazyLock;

use pulldown_cmark::{Event, Options, Parser, html};
use regex::{Captures, Regex};

use crate::model::Change;

/// A `#123` reference not glued to a preceding word, URL, or entity.
/// A leading `!` marks the reference as escaped.
static TICKET_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|[^0-9A-Z&/?!]+)(!?#)([0-9]+)").expect("ticket reference pattern")
});

static LIST_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t,]+").expect("list separator pattern"));

/// Fields whose values are whitespace/comma separated sets.
const SET_FIELDS: [&str; 2] = ["keywords", "cc"];

/// Escape `& > < " '` for HTML output.
///
/// The apostrophe maps to `&#32;`, a space entity, not `&#39;`.
#[must_use]
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '>' => out.push_str("&gt;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#32;"),
            other => out.push(other),
        }
    }
    out
}

/// Anchor markup for a ticket: `<a href="/ticket/<id>">label</a>`.
#[must_use]
pub fn ticket_link(ticket_id: &str, label: &str) -> String {
    format!(
        "<a href=\"/ticket/{}\">{}</a>",
        html_escape(ticket_id),
        html_escape(label)
    )
}

/// Replace `#<digits>` references with links to `/ticket/<digits>`.
///
/// `!#<digits>` is emitted as plain `#<digits>` with the `!` dropped. Text
/// around a reference is passed through untouched.
#[must_use]
pub fn link_tickets(text: &str) -> String {
    TICKET_REF
        .replace_all(text, |caps: &Captures<'_>| {
            let before = &caps[1];
            let hash = &caps[2];
            let digits = &caps[3];
            if hash.starts_with('!') {
                format!("{before}#{digits}")
            } else {
                let digits = html_escape(digits);
                format!(
                    "{before}<a href=\"/ticket/{digits}\">{}{digits}</a>",
                    html_escape(hash)
                )
            }
        })
        .into_owned()
}

/// Renders raw wiki text to HTML.
///
/// Implementations own the markup grammar; callers treat the output as
/// opaque HTML.
pub trait WikiRenderer {
    /// Render `text` to an HTML fragment.
    fn render(&self, text: &str) -> String;
}

/// Default wiki renderer backed by `pulldown-cmark`.
///
/// Raw HTML in the source is emitted as escaped text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownWiki;

impl WikiRenderer for MarkdownWiki {
    fn render(&self, text: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        let parser = Parser::new_ext(text, options).map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });
        let mut out = String::with_capacity(text.len() + text.len() / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// Render `text` as wiki markup, then link ticket references in the result.
#[must_use]
pub fn wiki_format(renderer: &dyn WikiRenderer, text: &str) -> String {
    link_tickets(&renderer.render(text))
}

/// Uppercase the first character, leaving the rest untouched.
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Tokens added to and removed from a delimited list value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDiff {
    /// Tokens in the new value missing from the old, in new-value order.
    pub added: Vec<String>,
    /// Tokens in the old value missing from the new, in old-value order.
    pub removed: Vec<String>,
}

fn list_of(s: &str) -> Vec<&str> {
    LIST_SEPARATOR.split(s).collect()
}

/// Membership diff of two space/tab/comma separated lists.
///
/// Duplicates are preserved on the side they appear.
#[must_use]
pub fn list_diff(old: &str, new: &str) -> ListDiff {
    let old_list = list_of(old);
    let new_list = list_of(new);
    let old_set: HashSet<&str> = old_list.iter().copied().collect();
    let new_set: HashSet<&str> = new_list.iter().copied().collect();
    ListDiff {
        added: new_list
            .iter()
            .filter(|token| !old_set.contains(*token))
            .map(|token| (*token).to_string())
            .collect(),
        removed: old_list
            .iter()
            .filter(|token| !new_set.contains(*token))
            .map(|token| (*token).to_string())
            .collect(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// One-line HTML summary of a single field change.
#[must_use]
pub fn change_format(change: &Change) -> String {
    if change.field == "description" {
        return "modified".to_string();
    }

    let old = non_empty(change.oldvalue.as_deref());
    let new = non_empty(change.newvalue.as_deref());

    if SET_FIELDS.contains(&change.field.as_str()) {
        let diff = list_diff(old.unwrap_or_default(), new.unwrap_or_default());
        let added = diff.added.join(", ");
        let removed = diff.removed.join(", ");
        if !added.is_empty() || !removed.is_empty() {
            let mut parts = Vec::with_capacity(2);
            if !added.is_empty() {
                parts.push(format!("<em>{}</em> added", html_escape(&added)));
            }
            if !removed.is_empty() {
                parts.push(format!("<em>{}</em> removed", html_escape(&removed)));
            }
            return parts.join("; ");
        }
    }

    match (old, new) {
        (Some(old), Some(new)) => format!(
            "changed from <em>{}</em> to <em>{}</em>",
            html_escape(old),
            html_escape(new)
        ),
        (Some(old), None) => format!("<em>{}</em> deleted", html_escape(old)),
        (None, new) => format!("set to <em>{}</em>", html_escape(new.unwrap_or_default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(field: &str, old: Option<&str>, new: Option<&str>) -> Change {
        Change {
            time: 0,
            author: "alice".to_string(),
            ticket: None,
            field: field.to_string(),
            oldvalue: old.map(str::to_string),
            newvalue: new.map(str::to_string),
        }
    }

    #[test]
    fn escape_table() {
        assert_eq!(
            html_escape(r#"a & b < c > d "e""#),
            "a &amp; b &lt; c &gt; d &quot;e&quot;"
        );
    }

    #[test]
    fn apostrophe_escapes_to_space_entity() {
        // Documents current behavior: `'` becomes a space entity, not `&#39;`.
        assert_eq!(html_escape("don't"), "don&#32;t");
    }

    #[test]
    fn links_plain_reference_and_unlinks_escaped_one() {
        let out = link_tickets("Fixed in #123 by !#456");
        assert_eq!(out, "Fixed in <a href=\"/ticket/123\">#123</a> by #456");
    }

    #[test]
    fn reference_at_start_of_text() {
        assert_eq!(
            link_tickets("#7 is done"),
            "<a href=\"/ticket/7\">#7</a> is done"
        );
    }

    #[test]
    fn glued_references_are_left_alone() {
        for text in ["abc#12", "&#123;", "/path#4", "?q#9", "x1#2"] {
            assert_eq!(link_tickets(text), text, "{text}");
        }
    }

    #[test]
    fn reference_after_punctuation() {
        assert_eq!(
            link_tickets("(see #42)"),
            "(see <a href=\"/ticket/42\">#42</a>)"
        );
    }

    #[test]
    fn wiki_format_links_after_rendering() {
        let html = wiki_format(&MarkdownWiki, "see #5 and *this*");
        assert!(html.contains("<a href=\"/ticket/5\">#5</a>"), "{html}");
        assert!(html.contains("<em>this</em>"), "{html}");
    }

    #[test]
    fn wiki_format_does_not_relink_entities() {
        let html = wiki_format(&MarkdownWiki, "a < b");
        assert!(html.contains("&lt;"), "{html}");
        assert!(!html.contains("/ticket/"), "{html}");
    }

    #[test]
    fn markdown_wiki_escapes_raw_html() {
        let html = MarkdownWiki.render("<script>alert(1)</script>\n\nhi <img src=x onerror=alert(1)> #3");
        assert!(!html.contains("<script"), "{html}");
        assert!(!html.contains("<img"), "{html}");
        assert!(html.contains("&lt;script&gt;"), "{html}");
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"), "{html}");
        assert_eq!(MarkdownWiki.render("a <b>bold</b> c"), "<p>a &lt;b&gt;bold&lt;/b&gt; c</p>\n");
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("status"), "Status");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("élan"), "Élan");
    }

    #[test]
    fn list_diff_by_membership() {
        let diff = list_diff("a, b c", "b,c d d");
        assert_eq!(diff.added, vec!["d", "d"]);
        assert_eq!(diff.removed, vec!["a"]);
    }

    #[test]
    fn description_gets_placeholder() {
        let c = change("description", Some("old"), Some("new"));
        assert_eq!(change_format(&c), "modified");
    }

    #[test]
    fn set_field_reports_added_and_removed() {
        let c = change("keywords", Some("ui perf"), Some("perf api"));
        assert_eq!(
            change_format(&c),
            "<em>api</em> added; <em>ui</em> removed"
        );

        let c = change("cc", Some("bob"), Some("bob, carol, dan"));
        assert_eq!(change_format(&c), "<em>carol, dan</em> added");
    }

    #[test]
    fn set_field_reorder_falls_back_to_changed() {
        let c = change("cc", Some("a b"), Some("b a"));
        assert_eq!(
            change_format(&c),
            "changed from <em>a b</em> to <em>b a</em>"
        );
    }

    #[test]
    fn scalar_field_wording() {
        assert_eq!(
            change_format(&change("status", Some("new"), Some("closed"))),
            "changed from <em>new</em> to <em>closed</em>"
        );
        assert_eq!(
            change_format(&change("milestone", Some("1.0"), Some(""))),
            "<em>1.0</em> deleted"
        );
        assert_eq!(
            change_format(&change("owner", None, Some("bob"))),
            "set to <em>bob</em>"
        );
    }

    #[test]
    fn change_values_are_escaped() {
        let c = change("summary", None, Some("<b>"));
        assert_eq!(change_format(&c), "set to <em>&lt;b&gt;</em>");
    }

    #[test]
    fn ticket_link_markup() {
        assert_eq!(
            ticket_link("12", "#12"),
            "<a href=\"/ticket/12\">#12</a>"
        );
    }
}
