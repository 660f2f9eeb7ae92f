//! Report result sets grouped into display tables.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Extra, display_value, is_truthy, value_to_millis};
use crate::text::{capitalize, ticket_link};
use crate::time::iso_date;

/// Row key naming the group a row belongs to.
pub const GROUP_KEY: &str = "__group__";
/// Row key naming the row's color class.
pub const COLOR_KEY: &str = "__color__";

const DEFAULT_COLOR: &str = "3";
const DATE_COLUMNS: [&str; 3] = ["created", "reported", "due"];
const LINK_COLUMNS: [&str; 2] = ["ticket", "summary"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    #[serde(default)]
    pub results: Vec<Extra>,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Name of the grouping column, used to label groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ReportDocument {
    /// `{<id>} ` when the report has an id, else empty.
    #[must_use]
    pub fn title_prefix(&self) -> String {
        if is_truthy(self.report_id.as_ref()) {
            format!("{{{}}} ", display_value(self.report_id.as_ref()))
        } else {
            String::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub class: String,
    pub value: Value,
    /// Pre-rendered markup for ticket and summary columns.
    pub html_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRow {
    pub class: String,
    pub cells: Vec<Cell>,
}

/// A contiguous run of rows sharing a `__group__` value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub name: String,
    pub id: Value,
    pub rows: Vec<RenderRow>,
    pub match_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    #[serde(flatten)]
    pub document: ReportDocument,
    pub match_count: usize,
    pub groups: Vec<Group>,
    pub visible_columns: Vec<String>,
}

fn cell(row: &Extra, column: &str) -> Cell {
    let class = column.to_lowercase();
    let raw = row.get(column);

    if DATE_COLUMNS.contains(&class.as_str()) {
        let value = if is_truthy(raw) {
            raw.and_then(value_to_millis)
                .map_or_else(|| raw.cloned().unwrap_or(Value::Null), |ms| Value::String(iso_date(ms)))
        } else {
            Value::String(String::new())
        };
        return Cell {
            class,
            value,
            html_value: None,
        };
    }

    let html_value = LINK_COLUMNS.contains(&class.as_str()).then(|| {
        let marker = if class == "ticket" { "#" } else { "" };
        let label = format!("{marker}{}", display_value(raw));
        ticket_link(&display_value(row.get("ticket")), &label)
    });

    Cell {
        class,
        value: raw.cloned().unwrap_or(Value::Null),
        html_value,
    }
}

fn row_class(row: &Extra, index_in_group: usize) -> String {
    let color = row.get(COLOR_KEY);
    let color = if is_truthy(color) {
        display_value(color)
    } else {
        DEFAULT_COLOR.to_string()
    };
    let parity = if index_in_group % 2 == 1 { "odd" } else { "even" };
    format!("color{color}-{parity}")
}

/// Group rows by contiguous `__group__` runs and build their cells.
///
/// Rows are not re-sorted: a group key that reappears after a different one
/// opens a second group with the same id.
#[must_use]
pub fn transform(document: ReportDocument) -> ReportView {
    let visible_columns: Vec<String> = document
        .columns
        .iter()
        .filter(|column| !column.starts_with('_'))
        .cloned()
        .collect();
    let prefix = document
        .group
        .as_deref()
        .map(|g| format!("{}: ", capitalize(g)))
        .unwrap_or_default();

    let mut groups: Vec<Group> = Vec::new();
    for row in &document.results {
        let key = row.get(GROUP_KEY).cloned().unwrap_or(Value::Null);
        if groups.last().is_none_or(|group| group.id != key) {
            groups.push(Group {
                name: format!("{prefix}{}", display_value(Some(&key))),
                id: key,
                rows: Vec::new(),
                match_count: 0,
            });
        }
        let Some(group) = groups.last_mut() else {
            continue;
        };
        group.rows.push(RenderRow {
            class: row_class(row, group.match_count),
            cells: visible_columns.iter().map(|column| cell(row, column)).collect(),
        });
        group.match_count += 1;
    }

    ReportView {
        match_count: document.results.len(),
        document,
        groups,
        visible_columns,
    }
}
