use crate::render::PageState;

/// Browser-style session history holding page snapshots.
pub trait History {
    /// Record `state` as the newest entry, dropping any forward entries.
    fn push_state(&mut self, state: PageState);
    fn back(&mut self) -> Option<PageState>;
    fn forward(&mut self) -> Option<PageState>;
}

/// In-process [`History`] backed by a vector and a cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryHistory {
    entries: Vec<PageState>,
    cursor: usize,
}

impl MemoryHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Option<&PageState> {
        self.entries.get(self.cursor)
    }

    #[must_use]
    pub fn entries(&self) -> &[PageState] {
        &self.entries
    }
}

impl History for MemoryHistory {
    fn push_state(&mut self, state: PageState) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(state);
        self.cursor = self.entries.len() - 1;
    }

    fn back(&mut self) -> Option<PageState> {
        self.cursor = self.cursor.checked_sub(1)?;
        self.entries.get(self.cursor).cloned()
    }

    fn forward(&mut self) -> Option<PageState> {
        let next = self.cursor + 1;
        let state = self.entries.get(next).cloned()?;
        self.cursor = next;
        Some(state)
    }
}
