//! Per-page transformers from raw documents to template view models.
//!
//! A document's `template` field selects a [`PageKind`]. Decoding into a
//! [`Page`] types the fields each transformer reads; [`transform`] then
//! produces a [`PageView`]: which template renders which region, and the JSON
//! view model.

pub mod milestone;
pub mod report;
pub mod ticket;
pub mod timeline;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::model::{DocumentHeader, Extra};
use crate::text::{MarkdownWiki, WikiRenderer};
use crate::time::{day_before, iso_date_of, truncate_to_day};

pub use milestone::{MilestoneEntry, MilestoneListDocument};
pub use report::{Cell, Group, RenderRow, ReportDocument};
pub use ticket::TicketDocument;
pub use timeline::{Day, TimelineDocument, TimelineEntry};

/// The page kinds this front end knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Report,
    ReportList,
    MilestoneList,
    Ticket,
    Timeline,
    Index,
}

impl PageKind {
    pub const ALL: [Self; 6] = [
        Self::Report,
        Self::ReportList,
        Self::MilestoneList,
        Self::Ticket,
        Self::Timeline,
        Self::Index,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::ReportList => "report_list",
            Self::MilestoneList => "milestone_list",
            Self::Ticket => "ticket",
            Self::Timeline => "timeline",
            Self::Index => "index",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a `template` value with no matching page kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown page template '{0}'")]
pub struct UnknownPageKind(pub String);

impl FromStr for PageKind {
    type Err = UnknownPageKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownPageKind(s.to_string()))
    }
}

/// Page-specific payload of a decoded document.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Report(ReportDocument),
    ReportList(Extra),
    MilestoneList(MilestoneListDocument),
    Ticket(TicketDocument),
    Timeline(TimelineDocument),
    Index(Extra),
    /// A template this front end does not render.
    Unknown(Extra),
}

impl Page {
    #[must_use]
    pub const fn kind(&self) -> Option<PageKind> {
        match self {
            Self::Report(_) => Some(PageKind::Report),
            Self::ReportList(_) => Some(PageKind::ReportList),
            Self::MilestoneList(_) => Some(PageKind::MilestoneList),
            Self::Ticket(_) => Some(PageKind::Ticket),
            Self::Timeline(_) => Some(PageKind::Timeline),
            Self::Index(_) => Some(PageKind::Index),
            Self::Unknown(_) => None,
        }
    }
}

/// A fetched page document: common header plus typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub header: DocumentHeader,
    pub page: Page,
}

fn decode<T: DeserializeOwned>(kind: PageKind, value: Value) -> Result<T, ViewError> {
    serde_json::from_value(value).map_err(|source| ViewError::Payload { kind, source })
}

fn into_object(value: Value) -> Extra {
    match value {
        Value::Object(map) => map,
        _ => Extra::new(),
    }
}

impl Document {
    /// Decode a raw document, selecting the payload type from `template`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::NotAnObject`] when `value` is not a JSON object,
    /// [`ViewError::Header`] when the common fields are malformed, and
    /// [`ViewError::Payload`] when a known page's fields are malformed.
    /// Unknown templates are not an error.
    pub fn from_value(value: Value) -> Result<Self, ViewError> {
        if !value.is_object() {
            return Err(ViewError::NotAnObject);
        }
        let header = DocumentHeader::deserialize(&value).map_err(ViewError::Header)?;
        let page = match header.template.parse::<PageKind>() {
            Ok(kind @ PageKind::Report) => Page::Report(decode(kind, value)?),
            Ok(PageKind::ReportList) => Page::ReportList(into_object(value)),
            Ok(kind @ PageKind::MilestoneList) => Page::MilestoneList(decode(kind, value)?),
            Ok(kind @ PageKind::Ticket) => Page::Ticket(decode(kind, value)?),
            Ok(kind @ PageKind::Timeline) => Page::Timeline(decode(kind, value)?),
            Ok(PageKind::Index) => Page::Index(into_object(value)),
            Err(unknown) => {
                tracing::debug!(template = %unknown.0, "no transformer for template");
                Page::Unknown(into_object(value))
            }
        };
        Ok(Self { header, page })
    }

    /// Browser title for this document.
    #[must_use]
    pub fn title(&self, config: &ViewConfig) -> String {
        let postfix = &config.title_postfix;
        match &self.page {
            Page::Report(report) => format!(
                "{}{}{postfix}",
                report.title_prefix(),
                self.header.title
            ),
            Page::Ticket(ticket) => format!("{}{postfix}", ticket.title()),
            Page::Unknown(_) => String::new(),
            Page::ReportList(_) | Page::MilestoneList(_) | Page::Timeline(_) | Page::Index(_) => {
                format!("{}{postfix}", self.header.title)
            }
        }
    }
}

/// Which template renders each page region. `None` clears the region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderPlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altlinks: Option<&'static str>,
}

impl RenderPlan {
    #[must_use]
    pub const fn content(template: &'static str) -> Self {
        Self {
            content: Some(template),
            altlinks: None,
        }
    }

    /// Placeholder shown while a navigation is in flight.
    #[must_use]
    pub const fn loading() -> Self {
        Self::content("loading")
    }

    /// Placeholder shown when a navigation failed.
    #[must_use]
    pub const fn failed() -> Self {
        Self::content("error")
    }
}

/// A transformed page ready for template rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<PageKind>,
    pub plan: RenderPlan,
    pub model: Value,
}

impl PageView {
    /// The empty view of an unknown page: nothing rendered anywhere.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            kind: None,
            plan: RenderPlan::default(),
            model: Value::Object(Extra::new()),
        }
    }
}

/// Everything a transformer needs besides the document.
///
/// Captured once per page load, so relative times stay consistent while a
/// view is on screen.
pub struct ViewContext {
    now_millis: i64,
    today: String,
    yesterday: String,
    config: ViewConfig,
    wiki: Box<dyn WikiRenderer>,
}

impl fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewContext")
            .field("now_millis", &self.now_millis)
            .field("today", &self.today)
            .field("yesterday", &self.yesterday)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ViewContext {
    /// Build a context for `now` in `now`'s time zone.
    #[must_use]
    pub fn new<Tz: TimeZone>(now: &DateTime<Tz>, config: ViewConfig) -> Self {
        Self {
            now_millis: now.timestamp_millis(),
            today: iso_date_of(&truncate_to_day(now)),
            yesterday: iso_date_of(&day_before(now)),
            config,
            wiki: Box::new(MarkdownWiki),
        }
    }

    /// Build a context from the local wall clock.
    #[must_use]
    pub fn capture(config: ViewConfig) -> Self {
        Self::new(&Local::now(), config)
    }

    /// Replace the wiki renderer.
    #[must_use]
    pub fn with_wiki(mut self, wiki: impl WikiRenderer + 'static) -> Self {
        self.wiki = Box::new(wiki);
        self
    }

    #[must_use]
    pub const fn now_millis(&self) -> i64 {
        self.now_millis
    }

    /// ISO date of local midnight today.
    #[must_use]
    pub fn today(&self) -> &str {
        &self.today
    }

    /// ISO date of local midnight yesterday.
    #[must_use]
    pub fn yesterday(&self) -> &str {
        &self.yesterday
    }

    #[must_use]
    pub const fn config(&self) -> &ViewConfig {
        &self.config
    }

    #[must_use]
    pub fn wiki(&self) -> &dyn WikiRenderer {
        self.wiki.as_ref()
    }
}

fn to_model<T: Serialize>(kind: PageKind, view: &T) -> Result<Value, ViewError> {
    serde_json::to_value(view).map_err(|source| ViewError::Payload { kind, source })
}

fn pass_through(extra: Extra) -> Value {
    Value::Object(extra)
}

/// Transform a decoded document into its view.
///
/// # Errors
///
/// Returns [`ViewError::Payload`] if a view model fails to serialize.
pub fn transform(page: Page, ctx: &ViewContext) -> Result<PageView, ViewError> {
    let kind = page.kind();
    let (plan, model) = match page {
        Page::Report(doc) => (
            RenderPlan {
                content: Some("report"),
                altlinks: Some("altlinks"),
            },
            to_model(PageKind::Report, &report::transform(doc))?,
        ),
        Page::ReportList(extra) => (RenderPlan::content("report_list"), pass_through(extra)),
        Page::MilestoneList(doc) => (
            RenderPlan::content("milestone_list"),
            to_model(PageKind::MilestoneList, &milestone::transform(doc, ctx))?,
        ),
        Page::Ticket(doc) => (
            RenderPlan::content("ticket"),
            to_model(PageKind::Ticket, &ticket::transform(doc, ctx))?,
        ),
        Page::Timeline(doc) => (
            RenderPlan::content("timeline"),
            to_model(PageKind::Timeline, &timeline::transform(doc, ctx))?,
        ),
        Page::Index(extra) => (RenderPlan::content("index"), pass_through(extra)),
        Page::Unknown(_) => return Ok(PageView::empty()),
    };
    tracing::debug!(kind = ?kind, "transformed document");
    Ok(PageView { kind, plan, model })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn ctx() -> ViewContext {
        let now = Utc
            .with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        ViewContext::new(&now, ViewConfig::default())
    }

    #[test]
    fn page_kind_round_trips_through_str() {
        for kind in PageKind::ALL {
            assert_eq!(kind.as_str().parse::<PageKind>(), Ok(kind));
        }
        assert!("search".parse::<PageKind>().is_err());
    }

    #[test]
    fn context_labels_today_and_yesterday() {
        let ctx = ctx();
        assert_eq!(ctx.today(), "2024-06-15");
        assert_eq!(ctx.yesterday(), "2024-06-14");
    }

    #[test]
    fn unknown_template_is_an_empty_view() {
        let doc = Document::from_value(json!({"template": "search", "title": "Search"}))
            .expect("unknown templates decode");
        assert_eq!(doc.page.kind(), None);
        assert_eq!(doc.title(&ViewConfig::default()), "");
        let view = transform(doc.page, &ctx()).expect("transform");
        assert_eq!(view.plan, RenderPlan::default());
        assert_eq!(view.model, json!({}));
    }

    #[test]
    fn pass_through_pages_keep_document() {
        let doc = Document::from_value(json!({
            "template": "report_list",
            "title": "Reports",
            "reports": [{"id": 1, "title": "Active"}]
        }))
        .expect("decode");
        let view = transform(doc.page, &ctx()).expect("transform");
        assert_eq!(view.kind, Some(PageKind::ReportList));
        assert_eq!(view.plan, RenderPlan::content("report_list"));
        assert_eq!(view.model["reports"][0]["title"], "Active");
    }

    #[test]
    fn default_title_uses_postfix() {
        let doc = Document::from_value(json!({"template": "index", "title": "Home"}))
            .expect("decode");
        let config = ViewConfig {
            title_postfix: " [tracker]".to_string(),
            ..ViewConfig::default()
        };
        assert_eq!(doc.title(&config), "Home [tracker]");
    }

    #[test]
    fn non_object_document_is_rejected() {
        assert!(matches!(
            Document::from_value(json!([1, 2])),
            Err(ViewError::NotAnObject)
        ));
    }

    #[test]
    fn malformed_known_payload_is_an_error() {
        let err = Document::from_value(json!({"template": "report", "title": "R", "results": 5}))
            .expect_err("results must be a list");
        assert!(matches!(err, ViewError::Payload { kind: PageKind::Report, .. }));
    }
}
