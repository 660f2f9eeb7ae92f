//! Template catalog and the dispatcher that draws a page onto a surface.
//!
//! Templates themselves are opaque: a [`TemplateEngine`] turns a template
//! source plus a JSON view model into markup. The dispatcher decides which
//! template fills which region, clears regions that have none, and hands
//! the result to a [`Surface`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{RenderError, TemplateError, ViewError};
use crate::nav::Surface;
use crate::nav::link::strip_fragment;
use crate::view::{self, Document, PageView, RenderPlan, ViewContext};

/// MIME type marking a `<script>` block as a named template.
pub const TEMPLATE_SCRIPT_TYPE: &str = "text/x-mustache-template";

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("script block pattern")
});

static SCRIPT_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\btype\s*=\s*["']([^"']*)["']"#).expect("type attribute pattern")
});

static SCRIPT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bname\s*=\s*["']([^"']*)["']"#).expect("name attribute pattern")
});

/// A page region the dispatcher writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Content,
    AltLinks,
}

impl Region {
    pub const ALL: [Self; 2] = [Self::Content, Self::AltLinks];

    /// Element id of the region in the host page.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::AltLinks => "altlinks",
        }
    }

    #[must_use]
    pub const fn template_in(self, plan: &RenderPlan) -> Option<&'static str> {
        match self {
            Self::Content => plan.content,
            Self::AltLinks => plan.altlinks,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Named template sources, read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSet {
    templates: BTreeMap<String, String>,
}

impl TemplateSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every `<script type="text/x-mustache-template" name="...">`
    /// block in `html`. Later blocks with a repeated name win.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        let mut set = Self::new();
        for block in SCRIPT_BLOCK.captures_iter(html) {
            let attrs = &block[1];
            let is_template = SCRIPT_TYPE
                .captures(attrs)
                .is_some_and(|t| t[1].trim().eq_ignore_ascii_case(TEMPLATE_SCRIPT_TYPE));
            if !is_template {
                continue;
            }
            let Some(name) = SCRIPT_NAME.captures(attrs) else {
                tracing::warn!("template script block without a name attribute");
                continue;
            };
            set.insert(&name[1], &block[2]);
        }
        tracing::debug!(templates = set.len(), "scanned template catalog");
        set
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Renders a template source against a JSON view model.
pub trait TemplateEngine {
    /// # Errors
    ///
    /// Returns [`TemplateError::Engine`] when the source cannot be rendered.
    fn render(&self, source: &str, view: &Value) -> Result<String, TemplateError>;
}

/// Snapshot of a loaded page, enough to redraw it without refetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageState {
    pub title: String,
    /// The document as fetched.
    pub doc: Value,
    pub url: String,
}

pub struct Dispatcher {
    ctx: ViewContext,
    templates: TemplateSet,
    engine: Box<dyn TemplateEngine>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("ctx", &self.ctx)
            .field("templates", &self.templates.len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(ctx: ViewContext, templates: TemplateSet, engine: impl TemplateEngine + 'static) -> Self {
        Self {
            ctx,
            templates,
            engine: Box::new(engine),
        }
    }

    #[must_use]
    pub const fn context(&self) -> &ViewContext {
        &self.ctx
    }

    #[must_use]
    pub const fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Build the page state for a freshly fetched document.
    ///
    /// # Errors
    ///
    /// Returns a [`ViewError`] when the document cannot be decoded.
    pub fn load(&self, doc: Value, url: &str) -> Result<PageState, ViewError> {
        let document = Document::from_value(doc.clone())?;
        let title = document.title(self.ctx.config());
        tracing::debug!(template = %document.header.template, %title, "loaded document");
        Ok(PageState {
            title,
            doc,
            url: url.to_string(),
        })
    }

    /// Draw `state` onto `surface`.
    ///
    /// Sets the username and title, fills or clears every region, then
    /// re-hooks link interception and scrolls to the URL's fragment.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::View`] when the stored document no longer
    /// decodes, and [`RenderError::Template`] when the engine fails.
    pub fn render(&self, state: &PageState, surface: &mut dyn Surface) -> Result<PageView, RenderError> {
        let document = Document::from_value(state.doc.clone())?;
        if let Some(user) = document.header.user.as_deref() {
            surface.set_username(user);
        }
        surface.set_title(&state.title);

        let page_view = view::transform(document.page, &self.ctx)?;
        self.draw(page_view.plan, &page_view.model, surface)?;

        if let Some(fragment) = strip_fragment(&state.url).1.filter(|f| !f.is_empty()) {
            surface.scroll_to(fragment);
        }
        Ok(page_view)
    }

    /// Draw a placeholder page that carries no document.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Engine`] when the engine fails.
    pub fn render_placeholder(
        &self,
        plan: RenderPlan,
        model: &Value,
        surface: &mut dyn Surface,
    ) -> Result<(), TemplateError> {
        self.draw(plan, model, surface)
    }

    /// The view model handed to the `error` template.
    #[must_use]
    pub fn failure_model(url: &str, message: &str) -> Value {
        json!({"title": "Error", "url": url, "message": message})
    }

    fn draw(&self, plan: RenderPlan, model: &Value, surface: &mut dyn Surface) -> Result<(), TemplateError> {
        for region in Region::ALL {
            let Some(name) = region.template_in(&plan) else {
                surface.clear_region(region);
                continue;
            };
            let Some(source) = self.templates.get(name) else {
                tracing::warn!(template = name, %region, "template not in catalog; clearing region");
                surface.clear_region(region);
                continue;
            };
            let html = self.engine.render(source, model)?;
            surface.set_region(region, &html);
            surface.intercept_links(region);
        }
        tracing::debug!(content = ?plan.content, altlinks = ?plan.altlinks, "drew page");
        Ok(())
    }
}
