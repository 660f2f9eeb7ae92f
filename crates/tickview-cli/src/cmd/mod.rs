pub mod browse;
pub mod completions;
pub mod view;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tickview_core::error::TemplateError;
use tickview_core::nav::MemorySurface;
use tickview_core::render::{Region, TemplateEngine, TemplateSet};
use tickview_core::view::PageKind;

use crate::output::{pretty_kv, pretty_section};

/// Mustache rendering of templates against the view model.
///
/// Each call compiles `source`; catalogs are small and pages render once.
#[derive(Debug, Clone, Copy, Default)]
pub struct MustacheEngine;

impl TemplateEngine for MustacheEngine {
    fn render(&self, source: &str, view: &Value) -> Result<String, TemplateError> {
        let template =
            mustache::compile_str(source).map_err(|err| TemplateError::Engine(err.to_string()))?;
        template
            .render_to_string(view)
            .map_err(|err| TemplateError::Engine(err.to_string()))
    }
}

/// Catalog used when no template page is given: one `<name>: {{title}}`
/// template per page kind plus the placeholders.
#[must_use]
pub fn default_templates() -> TemplateSet {
    PageKind::ALL
        .into_iter()
        .map(PageKind::as_str)
        .chain(["altlinks", "loading", "error"])
        .fold(TemplateSet::new(), |set, name| {
            set.with(name, format!("{name}: {{{{title}}}}"))
        })
}

/// Load templates from an HTML page, or the default catalog.
///
/// # Errors
///
/// Fails when the page cannot be read.
pub fn load_templates(path: Option<&Path>) -> Result<TemplateSet> {
    let Some(path) = path else {
        return Ok(default_templates());
    };
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read templates from {}", path.display()))?;
    let templates = TemplateSet::from_html(&html);
    if templates.is_empty() {
        tracing::warn!(path = %path.display(), "no templates found in page");
    }
    Ok(templates)
}

/// What a surface ended up showing, in a serializable shape.
#[derive(Debug, Serialize)]
pub struct SurfaceReport<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
    pub regions: BTreeMap<&'static str, &'a str>,
    pub closed_links: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrolled_to: Option<&'a str>,
}

impl<'a> SurfaceReport<'a> {
    #[must_use]
    pub fn of(surface: &'a MemorySurface) -> Self {
        Self {
            title: surface.title(),
            username: surface.username(),
            regions: Region::ALL
                .into_iter()
                .map(|region| (region.id(), surface.region(region)))
                .collect(),
            closed_links: surface.closed_links().collect(),
            scrolled_to: surface.scrolled_to(),
        }
    }

    pub fn write_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}", self.title)?;
        for (id, html) in &self.regions {
            if !html.is_empty() {
                writeln!(w, "[{id}] {html}")?;
            }
        }
        Ok(())
    }

    pub fn write_pretty(&self, w: &mut dyn Write) -> std::io::Result<()> {
        pretty_section(w, self.title)?;
        if let Some(user) = self.username {
            pretty_kv(w, "User", user)?;
        }
        if !self.closed_links.is_empty() {
            pretty_kv(w, "Closed", self.closed_links.join(", "))?;
        }
        if let Some(fragment) = self.scrolled_to {
            pretty_kv(w, "Anchor", fragment)?;
        }
        for (id, html) in &self.regions {
            writeln!(w)?;
            writeln!(w, "#{id}")?;
            if html.is_empty() {
                writeln!(w, "  (empty)")?;
            } else {
                for line in html.lines() {
                    writeln!(w, "  {line}")?;
                }
            }
        }
        Ok(())
    }
}
