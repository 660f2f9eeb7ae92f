//! In-place navigation between pages.
//!
//! [`Navigator`] is an explicit state machine over [`Phase`]. Fetching is
//! the host's job: [`Navigator::navigate`] hands back a [`FetchRequest`] and
//! the host answers with [`Navigator::complete`]. Each request carries the
//! navigation generation it belongs to, so an answer that arrives after a
//! newer navigation started is discarded instead of drawn.
//!
//! ```text
//! Idle ──navigate──▶ Loading ──complete(ok)──▶ Loaded ──▶ Rendered ──closed tickets──▶ Idle
//!                        └──complete(err)──▶ Failed
//! ```

pub mod closed;
pub mod fetch;
pub mod history;
pub mod link;
pub mod surface;

use serde::Serialize;
use serde_json::{Value, json};
use url::Url;

use crate::config::ViewConfig;
use crate::error::{FetchError, NavError};
use crate::render::{Dispatcher, PageState};
use crate::view::RenderPlan;

pub use closed::ClosedTickets;
pub use fetch::{Fetcher, MemoryFetcher};
pub use history::{History, MemoryHistory};
pub use link::{LinkClick, json_url, should_intercept};
pub use surface::{MemorySurface, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Rendered,
    Failed,
}

/// A JSON fetch the host should perform and report back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchRequest {
    pub generation: u64,
    /// Page URL the request belongs to.
    pub url: String,
    /// URL to GET.
    pub json_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Let the host follow the link normally.
    Follow,
    Navigate(FetchRequest),
}

pub struct Navigator<S> {
    dispatcher: Dispatcher,
    surface: S,
    history: Option<Box<dyn History>>,
    phase: Phase,
    generation: u64,
    page_url: String,
    current: Option<PageState>,
}

impl<S: Surface> Navigator<S> {
    /// A navigator whose current page is the configured base URL.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, surface: S) -> Self {
        let page_url = dispatcher.context().config().base_url.clone();
        Self {
            dispatcher,
            surface,
            history: None,
            phase: Phase::Idle,
            generation: 0,
            page_url,
            current: None,
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: impl History + 'static) -> Self {
        self.history = Some(Box::new(history));
        self
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    #[must_use]
    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Snapshot of the page on screen.
    #[must_use]
    pub const fn current(&self) -> Option<&PageState> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    const fn config(&self) -> &ViewConfig {
        self.dispatcher.context().config()
    }

    /// History integration needs both a history and the config switch.
    #[must_use]
    pub const fn history_enabled(&self) -> bool {
        self.config().history && self.history.is_some()
    }

    fn resolve(&self, href: &str) -> Result<Url, NavError> {
        Url::parse(&self.page_url)
            .and_then(|base| base.join(href))
            .map_err(|source| NavError::InvalidUrl {
                url: href.to_string(),
                source,
            })
    }

    /// Decide what a click on a link does.
    ///
    /// Without history integration every click is followed normally.
    pub fn on_click(&mut self, click: &LinkClick) -> ClickOutcome {
        if !self.history_enabled() || click.href.is_empty() {
            return ClickOutcome::Follow;
        }
        let Ok(target) = self.resolve(&click.href) else {
            return ClickOutcome::Follow;
        };
        let resolved = LinkClick {
            href: target.to_string(),
            ..click.clone()
        };
        if !should_intercept(&resolved, &self.config().base_url, &self.page_url) {
            return ClickOutcome::Follow;
        }
        ClickOutcome::Navigate(self.begin(resolved.href))
    }

    /// Start navigating to `url`, resolved against the current page.
    ///
    /// Draws the loading placeholder and supersedes any navigation still in
    /// flight.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::InvalidUrl`] when `url` does not resolve.
    pub fn navigate(&mut self, url: &str) -> Result<FetchRequest, NavError> {
        let target = self.resolve(url)?;
        Ok(self.begin(target.into()))
    }

    fn begin(&mut self, url: String) -> FetchRequest {
        self.generation += 1;
        self.phase = Phase::Loading;
        if let Err(err) =
            self.dispatcher
                .render_placeholder(RenderPlan::loading(), &json!({}), &mut self.surface)
        {
            tracing::warn!(error = %err, "loading placeholder failed to render");
        }
        tracing::debug!(generation = self.generation, %url, "navigation started");
        FetchRequest {
            generation: self.generation,
            json_url: json_url(&url),
            url,
        }
    }

    const fn is_stale(&self, request: &FetchRequest) -> bool {
        request.generation != self.generation
    }

    /// Apply the response to a page request.
    ///
    /// On success the page is loaded, pushed onto history when enabled, and
    /// drawn; the returned request fetches the closed-ticket index.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::Superseded`] without touching the page when a
    /// newer navigation started. Fetch, decode, and render failures move the
    /// navigator to [`Phase::Failed`] and draw the `error` template before
    /// being returned.
    pub fn complete(
        &mut self,
        request: &FetchRequest,
        response: Result<Value, FetchError>,
    ) -> Result<FetchRequest, NavError> {
        if self.is_stale(request) {
            tracing::warn!(
                stale = request.generation,
                latest = self.generation,
                url = %request.url,
                "discarding superseded response"
            );
            return Err(NavError::Superseded {
                generation: request.generation,
            });
        }

        let loaded = response
            .map_err(NavError::from)
            .and_then(|doc| self.dispatcher.load(doc, &request.url).map_err(NavError::from));
        let state = match loaded {
            Ok(state) => state,
            Err(err) => {
                self.fail(&request.url, &err);
                return Err(err);
            }
        };
        self.phase = Phase::Loaded;

        let push = self.config().history;
        if let Some(history) = self.history.as_mut().filter(|_| push) {
            history.push_state(state.clone());
        }
        self.show(state)
    }

    /// Redraw a stored page without fetching, as on a history event.
    ///
    /// # Errors
    ///
    /// Returns a [`NavError::Render`] when the stored page cannot be drawn.
    pub fn restore(&mut self, state: PageState) -> Result<FetchRequest, NavError> {
        self.generation += 1;
        tracing::debug!(generation = self.generation, url = %state.url, "restoring page");
        self.show(state)
    }

    /// Step back in history. `Ok(None)` when there is nothing to go back to.
    ///
    /// # Errors
    ///
    /// See [`Navigator::restore`].
    pub fn go_back(&mut self) -> Result<Option<FetchRequest>, NavError> {
        match self.history.as_mut().and_then(|h| h.back()) {
            Some(state) => self.restore(state).map(Some),
            None => Ok(None),
        }
    }

    /// Step forward in history. `Ok(None)` at the newest entry.
    ///
    /// # Errors
    ///
    /// See [`Navigator::restore`].
    pub fn go_forward(&mut self) -> Result<Option<FetchRequest>, NavError> {
        match self.history.as_mut().and_then(|h| h.forward()) {
            Some(state) => self.restore(state).map(Some),
            None => Ok(None),
        }
    }

    fn show(&mut self, state: PageState) -> Result<FetchRequest, NavError> {
        if let Err(err) = self.dispatcher.render(&state, &mut self.surface) {
            let err = NavError::from(err);
            self.fail(&state.url, &err);
            return Err(err);
        }
        self.phase = Phase::Rendered;
        self.page_url.clone_from(&state.url);
        self.current = Some(state);
        Ok(self.closed_tickets_request())
    }

    fn closed_tickets_request(&self) -> FetchRequest {
        let path = &self.config().closed_tickets_path;
        let url = self
            .resolve(path)
            .map_or_else(|_| path.clone(), String::from);
        FetchRequest {
            generation: self.generation,
            json_url: json_url(&url),
            url,
        }
    }

    fn fail(&mut self, url: &str, err: &NavError) {
        self.phase = Phase::Failed;
        tracing::warn!(error = %err, code = %err.code(), %url, "navigation failed");
        let model = Dispatcher::failure_model(url, &err.to_string());
        if let Err(err) =
            self.dispatcher
                .render_placeholder(RenderPlan::failed(), &model, &mut self.surface)
        {
            tracing::warn!(error = %err, "error placeholder failed to render");
        }
    }

    /// Decorate ticket links from the closed-ticket index. Best effort: a
    /// failed or stale response leaves links untouched. Returns how many
    /// links were marked closed.
    pub fn apply_closed_tickets(
        &mut self,
        request: &FetchRequest,
        response: Result<Value, FetchError>,
    ) -> usize {
        if self.is_stale(request) {
            tracing::debug!(stale = request.generation, "ignoring superseded closed tickets");
            return 0;
        }
        let marked = match response.and_then(|value| ClosedTickets::from_value(&value)) {
            Ok(closed) => closed::decorate(&mut self.surface, &closed),
            Err(err) => {
                tracing::warn!(error = %err, "closed tickets unavailable; links left undecorated");
                0
            }
        };
        if self.phase == Phase::Rendered {
            self.phase = Phase::Idle;
        }
        marked
    }

    /// Navigate to `url` and drive both fetches through `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns the first [`NavError`] of the page fetch. Closed-ticket
    /// failures are not errors.
    pub fn visit(&mut self, url: &str, fetcher: &dyn Fetcher) -> Result<usize, NavError> {
        let request = self.navigate(url)?;
        let closed = self.complete(&request, fetcher.get_json(&request.json_url))?;
        Ok(self.apply_closed_tickets(&closed, fetcher.get_json(&closed.json_url)))
    }
}
