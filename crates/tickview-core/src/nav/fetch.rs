use std::cell::RefCell;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::FetchError;

/// Blocking JSON GET.
pub trait Fetcher {
    /// # Errors
    ///
    /// Returns a [`FetchError`] for transport failures, error statuses, and
    /// bodies that are not JSON.
    fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// Canned responses keyed by URL. Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    responses: BTreeMap<String, Result<Value, FetchError>>,
    requested: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, url: impl Into<String>, response: Result<Value, FetchError>) -> Self {
        self.responses.insert(url.into(), response);
        self
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl Fetcher for MemoryFetcher {
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.requested.borrow_mut().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }
}
