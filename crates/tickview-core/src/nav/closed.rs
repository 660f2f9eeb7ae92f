//! Closed-ticket index and link decoration.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;

use super::Surface;

static TICKET_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/ticket/([0-9]+)").expect("ticket path pattern"));

/// Sorted, non-overlapping `(start, count)` ranges of closed ticket ids.
///
/// A range covers `start..=start + count`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosedTickets(Vec<(u64, u64)>);

#[derive(Deserialize)]
#[serde(untagged)]
enum Wire {
    Bare(Vec<(u64, u64)>),
    Wrapped { closed_tickets: Vec<(u64, u64)> },
}

impl ClosedTickets {
    /// Build from ranges in any order.
    #[must_use]
    pub fn new(mut ranges: Vec<(u64, u64)>) -> Self {
        ranges.sort_unstable_by_key(|&(start, _)| start);
        Self(ranges)
    }

    /// Decode a `[[start, count], ...]` array, bare or under `closed_tickets`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] for any other shape.
    pub fn from_value(value: &Value) -> Result<Self, FetchError> {
        let ranges = match Wire::deserialize(value) {
            Ok(Wire::Bare(ranges) | Wire::Wrapped { closed_tickets: ranges }) => ranges,
            Err(err) => return Err(FetchError::Decode(err.to_string())),
        };
        Ok(Self::new(ranges))
    }

    #[must_use]
    pub fn ranges(&self) -> &[(u64, u64)] {
        &self.0
    }

    /// Binary search for the range starting at or before `id`.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        let after = self.0.partition_point(|&(start, _)| start <= id);
        after
            .checked_sub(1)
            .and_then(|i| self.0.get(i))
            .is_some_and(|&(start, count)| id <= start.saturating_add(count))
    }
}

/// Ticket id of a `/ticket/<digits>` path. Anything else has none and is
/// never treated as closed.
#[must_use]
pub fn ticket_id_from_path(href: &str) -> Option<u64> {
    TICKET_PATH
        .captures(href)
        .and_then(|caps| caps[1].parse().ok())
}

/// Mark every ticket link on `surface`, closed or not. Returns how many
/// were closed.
pub fn decorate(surface: &mut dyn Surface, closed: &ClosedTickets) -> usize {
    let mut marked = 0;
    for href in surface.ticket_links() {
        let is_closed = ticket_id_from_path(&href).is_some_and(|id| closed.contains(id));
        surface.decorate_ticket_link(&href, is_closed);
        marked += usize::from(is_closed);
    }
    tracing::debug!(marked, "decorated closed tickets");
    marked
}
