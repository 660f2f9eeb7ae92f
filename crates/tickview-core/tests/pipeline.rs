//! Integration tests: document → dispatcher → transformer → engine → surface.
//!
//! The engine used here serializes the view model into the region, so each
//! test can read back exactly what a template would have been handed.

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use tickview_core::config::ViewConfig;
use tickview_core::error::TemplateError;
use tickview_core::nav::MemorySurface;
use tickview_core::render::{Dispatcher, Region, TemplateEngine, TemplateSet};
use tickview_core::view::ViewContext;

const DAY: i64 = 86_400_000;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

struct ModelDump;

impl TemplateEngine for ModelDump {
    fn render(&self, source: &str, view: &Value) -> Result<String, TemplateError> {
        let body = serde_json::to_string(view).map_err(|e| TemplateError::Engine(e.to_string()))?;
        Ok(format!("{source}|{body}"))
    }
}

fn now_millis() -> i64 {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
        .timestamp_millis()
}

fn dispatcher() -> Dispatcher {
    let now = Utc
        .with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp");
    let templates = [
        "report",
        "altlinks",
        "report_list",
        "milestone_list",
        "ticket",
        "timeline",
        "index",
    ]
    .into_iter()
    .fold(TemplateSet::new(), |set, name| set.with(name, name));
    Dispatcher::new(ViewContext::new(&now, ViewConfig::default()), templates, ModelDump)
}

/// Load and render `doc`, returning its title and the drawn surface.
fn render(doc: &Value) -> (String, MemorySurface) {
    let dispatcher = dispatcher();
    let state = dispatcher.load(doc.clone(), "/page").expect("load");
    let mut surface = MemorySurface::default();
    dispatcher.render(&state, &mut surface).expect("render");
    (state.title, surface)
}

fn region_model(surface: &MemorySurface, region: Region) -> (String, Value) {
    let (template, body) = surface
        .region(region)
        .split_once('|')
        .expect("region rendered by ModelDump");
    (
        template.to_string(),
        serde_json::from_str(body).expect("model is JSON"),
    )
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[test]
fn report_page_groups_rows_and_fills_altlinks() {
    let doc = json!({
        "template": "report",
        "title": "Active Tickets",
        "report_id": 1,
        "group": "milestone",
        "columns": ["__group__", "ticket", "summary", "created", "_hidden"],
        "results": [
            {"__group__": "1.0", "ticket": 3, "summary": "Crash", "created": 1_704_412_800_000_i64, "_hidden": 1},
            {"__group__": "1.0", "ticket": 4, "summary": "Hang", "created": 0},
            {"__group__": "2.0", "__color__": 1, "ticket": 9, "summary": "Typo", "created": 1_704_412_800_000_i64}
        ]
    });
    let (title, surface) = render(&doc);
    assert_eq!(title, "{1} Active Tickets [tickview]");

    let (template, model) = region_model(&surface, Region::Content);
    assert_eq!(template, "report");
    assert_eq!(model["match_count"], 3);
    assert_eq!(model["visible_columns"], json!(["ticket", "summary", "created"]));
    assert_eq!(model["groups"][0]["name"], "Milestone: 1.0");
    assert_eq!(model["groups"][0]["match_count"], 2);
    assert_eq!(model["groups"][1]["rows"][0]["class"], "color1-even");

    let first = &model["groups"][0]["rows"][0]["cells"];
    assert_eq!(first[0]["html_value"], "<a href=\"/ticket/3\">#3</a>");
    assert_eq!(first[2]["value"], "2024-01-05");
    assert_eq!(model["groups"][0]["rows"][1]["cells"][2]["value"], "");

    let (altlinks, _) = region_model(&surface, Region::AltLinks);
    assert_eq!(altlinks, "altlinks");
}

#[test]
fn report_list_and_index_pass_through() {
    let doc = json!({"template": "report_list", "title": "Reports", "reports": [{"id": 1}]});
    let (title, surface) = render(&doc);
    assert_eq!(title, "Reports [tickview]");
    let (template, model) = region_model(&surface, Region::Content);
    assert_eq!(template, "report_list");
    assert_eq!(model, doc);
    assert_eq!(surface.region(Region::AltLinks), "");

    let doc = json!({"template": "index", "title": "Welcome", "user": "ann"});
    let (_, surface) = render(&doc);
    assert_eq!(surface.username(), Some("ann"));
    assert_eq!(region_model(&surface, Region::Content).1, doc);
}

#[test]
fn milestone_list_annotates_progress_and_due_dates() {
    let doc = json!({
        "template": "milestone_list",
        "title": "Roadmap",
        "milestones": [
            {"name": "Release 1.0", "closed": 1, "total": 3, "due": now_millis() + 3 * DAY},
            {"name": "Someday", "closed": 0, "total": 0, "due": null},
            {"name": "Overdue", "closed": 7, "total": 8, "due": now_millis() - 14 * DAY}
        ]
    });
    let (_, surface) = render(&doc);
    let (_, model) = region_model(&surface, Region::Content);
    let milestones = model["milestones"].as_array().expect("milestones");

    assert_eq!(milestones[0]["pct_closed"], 33);
    assert_eq!(milestones[0]["pct_open"], 67);
    assert_eq!(milestones[0]["qname"], "Release+1.0");
    assert_eq!(milestones[0]["due_ago"], "Due in 3 days (2024-06-18)");

    assert_eq!(milestones[1]["pct_closed"], 0);
    assert_eq!(milestones[1]["pct_open"], 100);
    assert_eq!(milestones[1]["due_ago"], "No date set");

    assert_eq!(milestones[2]["pct_closed"], 88);
    assert_eq!(
        milestones[2]["due_ago"],
        "<strong>2 weeks late </strong> (2024-06-01)"
    );
}

#[test]
fn ticket_page_groups_history_into_comments() {
    let doc = json!({
        "template": "ticket",
        "title": "Ticket",
        "ticket": {
            "id": 7,
            "summary": "Login fails",
            "description": "Regressed by #5",
            "changes": [
                {"time": 1000, "author": "a", "ticket": 7, "field": "status", "oldvalue": "new", "newvalue": "assigned"},
                {"time": 1400, "author": "a", "ticket": 7, "field": "owner", "oldvalue": "", "newvalue": "a"},
                {"time": 1900, "author": "a", "ticket": 7, "field": "comment", "oldvalue": "1", "newvalue": "Taking this, not !#6"},
                {"time": 5000, "author": "b", "ticket": 7, "field": "keywords", "oldvalue": "ui login", "newvalue": "login auth"}
            ]
        }
    });
    let (title, surface) = render(&doc);
    assert_eq!(title, "#7 Login fails [tickview]");

    let (_, model) = region_model(&surface, Region::Content);
    let ticket = &model["ticket"];
    assert!(
        ticket["description_html"]
            .as_str()
            .expect("description html")
            .contains("<a href=\"/ticket/5\">#5</a>")
    );

    let comments = ticket["comments"].as_array().expect("comments");
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["cnum"], "1");
    assert_eq!(comments[0]["time"], 1000);
    assert_eq!(comments[0]["ago"], "54 years ago");
    let fields: Vec<&str> = comments[0]["changed"]
        .as_array()
        .expect("changed")
        .iter()
        .filter_map(|c| c["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["status", "owner"]);
    assert_eq!(comments[0]["changed"][1]["summary_html"], "set to <em>a</em>");
    let html = comments[0]["comment_html"].as_str().expect("comment html");
    assert!(html.contains("not #6"));
    assert!(!html.contains("/ticket/6"));

    assert_eq!(
        comments[1]["changed"][0]["summary_html"],
        "<em>auth</em> added; <em>ui</em> removed"
    );
    assert_eq!(comments[1]["has_changes"], true);
}

#[test]
fn timeline_buckets_days_newest_first() {
    let now = now_millis();
    let doc = json!({
        "template": "timeline",
        "title": "Timeline",
        "tickets": {"1": {"summary": "Crash"}, "2": {"summary": "Typo"}},
        "changes": [
            {"time": now - 3 * DAY, "author": "a", "ticket": 1, "field": "status", "oldvalue": "new", "newvalue": "closed"},
            {"time": now - DAY, "author": "b", "ticket": 2, "field": "comment", "oldvalue": "1", "newvalue": "fixed"},
            {"time": now - 60_000, "author": "a", "ticket": 1, "field": "status", "oldvalue": "closed", "newvalue": "reopened"}
        ]
    });
    let (_, surface) = render(&doc);
    let (template, model) = region_model(&surface, Region::Content);
    assert_eq!(template, "timeline");

    let days = model["days"].as_array().expect("days");
    assert_eq!(days.len(), 3);
    assert_eq!(days[0]["date"], "2024-06-15");
    assert_eq!(days[0]["today_or_yesterday"], "Today");
    assert_eq!(days[1]["today_or_yesterday"], "Yesterday");
    assert!(days[2].get("today_or_yesterday").is_none());

    let entry = &days[1]["day_changes"][0];
    assert_eq!(entry["summary"], "Typo");
    assert_eq!(entry["status_class"], "newticket");
    assert_eq!(entry["comment"], "fixed");
    assert_eq!(entry["ago"], "24 hours ago");
    assert_eq!(days[0]["day_changes"][0]["ago"], "60 seconds ago");
    assert_eq!(days[2]["day_changes"][0]["ago"], "3 days ago");
    assert_eq!(
        days[0]["day_changes"][0]["changed"][0]["summary_html"],
        "changed from <em>closed</em> to <em>reopened</em>"
    );
}

#[test]
fn unknown_template_clears_everything() {
    let (title, surface) = render(&json!({"template": "search", "title": "Search"}));
    assert_eq!(title, "");
    assert_eq!(surface.region(Region::Content), "");
    assert_eq!(surface.region(Region::AltLinks), "");
}
