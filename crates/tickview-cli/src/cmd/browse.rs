use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use tickview_core::config::ViewConfig;
use tickview_core::error::FetchError;
use tickview_core::nav::{Fetcher, MemoryHistory, MemorySurface, Navigator, Phase};
use tickview_core::render::Dispatcher;
use tickview_core::view::ViewContext;
use url::Url;

use super::{MustacheEngine, SurfaceReport, load_templates};
use crate::output::{OutputMode, pretty_kv, render_mode};

/// Arguments for `tv browse`.
#[derive(Args, Debug)]
pub struct BrowseArgs {
    /// Pages to visit in order. The first absolute URL sets the site root.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// HTML page holding `<script type="text/x-mustache-template">` blocks.
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Step back this many history entries after the last visit.
    #[arg(long, default_value_t = 0)]
    pub back: usize,

    /// Render pages in place without recording history.
    #[arg(long)]
    pub no_history: bool,
}

/// [`Fetcher`] over blocking HTTP.
pub struct UreqFetcher {
    agent: ureq::Agent,
}

impl Default for UreqFetcher {
    fn default() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .user_agent(concat!("tickview/", env!("CARGO_PKG_VERSION")))
                .build(),
        }
    }
}

impl Fetcher for UreqFetcher {
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        tracing::debug!(url, "GET");
        let response = self
            .agent
            .get(url)
            .set("Accept", "application/json")
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(code, _) => FetchError::Status(code),
                ureq::Error::Transport(transport) => FetchError::Transport(transport.to_string()),
            })?;
        response
            .into_json::<Value>()
            .map_err(|err| FetchError::Decode(err.to_string()))
    }
}

/// Site root (`scheme://host[:port]/`) of the first absolute URL, if any.
fn site_root(urls: &[String]) -> Option<String> {
    urls.iter()
        .find_map(|raw| Url::parse(raw).ok().filter(Url::has_host))
        .map(|url| format!("{}/", url.origin().ascii_serialization()))
}

#[derive(Debug, Serialize)]
struct BrowseOutput<'a> {
    url: &'a str,
    phase: Phase,
    generation: u64,
    closed_marked: usize,
    #[serde(flatten)]
    surface: SurfaceReport<'a>,
}

/// Visit pages through a [`Navigator`] and report the final surface.
///
/// # Errors
///
/// Fails on the first page that cannot be fetched, decoded, or rendered.
pub fn run_browse(args: &BrowseArgs, mut config: ViewConfig, output: OutputMode) -> Result<()> {
    if let Some(root) = site_root(&args.urls) {
        config.base_url = root;
    }
    if args.no_history {
        config.history = false;
    }
    let templates = load_templates(args.templates.as_deref())?;
    let dispatcher = Dispatcher::new(ViewContext::capture(config), templates, MustacheEngine);
    let mut nav =
        Navigator::new(dispatcher, MemorySurface::default()).with_history(MemoryHistory::new());
    let fetcher = UreqFetcher::default();

    let mut closed_marked = 0;
    for url in &args.urls {
        closed_marked = nav
            .visit(url, &fetcher)
            .with_context(|| format!("Failed to visit {url}"))?;
        tracing::info!(url = nav.page_url(), closed_marked, "visited");
    }

    for _ in 0..args.back {
        let Some(closed) = nav.go_back().context("Failed to restore history entry")? else {
            tracing::warn!("no earlier history entry");
            break;
        };
        closed_marked = nav.apply_closed_tickets(&closed, fetcher.get_json(&closed.json_url));
    }

    let report = BrowseOutput {
        url: nav.page_url(),
        phase: nav.phase(),
        generation: nav.generation(),
        closed_marked,
        surface: SurfaceReport::of(nav.surface()),
    };
    render_mode(
        output,
        &report,
        |r, w| {
            writeln!(w, "{}", r.url)?;
            r.surface.write_text(w)
        },
        |r, w| {
            pretty_kv(w, "URL", r.url)?;
            pretty_kv(w, "Closed", r.closed_marked.to_string())?;
            r.surface.write_pretty(w)
        },
    )
}
