use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use tickview_core::config::ViewConfig;
use tickview_core::nav::MemorySurface;
use tickview_core::render::Dispatcher;
use tickview_core::view::{PageKind, ViewContext};

use super::{MustacheEngine, SurfaceReport, load_templates};
use crate::output::{OutputMode, pretty_kv, render_mode};

/// Arguments for `tv view`.
#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Page document to render (`-` reads stdin).
    pub file: PathBuf,

    /// URL the document was served from; its `#fragment` sets the scroll anchor.
    #[arg(long, default_value = "/")]
    pub url: String,

    /// HTML page holding `<script type="text/x-mustache-template">` blocks.
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Render as if the clock read this RFC 3339 instant.
    #[arg(long)]
    pub now: Option<String>,

    /// Include the transformed view model in the output.
    #[arg(long)]
    pub model: bool,
}

#[derive(Debug, Serialize)]
struct ViewOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<PageKind>,
    #[serde(flatten)]
    surface: SurfaceReport<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a Value>,
}

fn read_document(file: &Path) -> Result<Value> {
    let raw = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read document from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", file.display()))
}

fn view_context(now: Option<&str>, config: ViewConfig) -> Result<ViewContext> {
    match now {
        Some(raw) => {
            let now = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("--now '{raw}' is not an RFC 3339 timestamp"))?;
            Ok(ViewContext::new(&now, config))
        }
        None => Ok(ViewContext::capture(config)),
    }
}

/// Render one page document and report what the surface shows.
///
/// # Errors
///
/// Fails when the document cannot be read, decoded, or rendered.
pub fn run_view(args: &ViewArgs, config: ViewConfig, output: OutputMode) -> Result<()> {
    let doc = read_document(&args.file)?;
    let ctx = view_context(args.now.as_deref(), config)?;
    let templates = load_templates(args.templates.as_deref())?;
    let dispatcher = Dispatcher::new(ctx, templates, MustacheEngine);

    let state = dispatcher
        .load(doc, &args.url)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    let mut surface = MemorySurface::default();
    let page = dispatcher
        .render(&state, &mut surface)
        .with_context(|| format!("Failed to render {}", args.file.display()))?;
    tracing::debug!(template = ?page.kind, title = %state.title, "rendered page");

    let report = ViewOutput {
        template: page.kind,
        surface: SurfaceReport::of(&surface),
        model: args.model.then_some(&page.model),
    };
    render_mode(
        output,
        &report,
        |r, w| {
            r.surface.write_text(w)?;
            if let Some(model) = r.model {
                writeln!(w, "{model}")?;
            }
            Ok(())
        },
        |r, w| {
            let template = r.template.map_or("(none)", PageKind::as_str);
            pretty_kv(w, "Template", template)?;
            r.surface.write_pretty(w)?;
            if let Some(model) = r.model {
                writeln!(w)?;
                writeln!(w, "{}", serde_json::to_string_pretty(model)?)?;
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_flag_parses_rfc3339() {
        let ctx = view_context(Some("2024-06-15T12:00:00Z"), ViewConfig::default())
            .expect("context");
        assert_eq!(ctx.today(), "2024-06-15");
        assert_eq!(ctx.yesterday(), "2024-06-14");
    }

    #[test]
    fn bad_now_flag_is_an_error() {
        let err = view_context(Some("yesterday"), ViewConfig::default()).expect_err("bad now");
        assert!(err.to_string().contains("RFC 3339"));
    }
}
