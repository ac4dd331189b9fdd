//! Header row resolution.

use std::collections::HashMap;

use crate::types::{CellValue, Sheet};

use super::source::Record;

/// Column name to 1-based column position, derived from one header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    by_name: HashMap<String, u32>,
    /// `(col, name)` in column order.
    ordered: Vec<(u32, String)>,
}

impl HeaderMap {
    /// Position of `name`, if the header row contains it.
    pub fn position(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Header names in column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(|(_, name)| name.as_str())
    }

    /// `(col, name)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (u32, &str)> {
        self.ordered.iter().map(|(col, name)| (*col, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Rightmost mapped column (0 when empty).
    pub fn last_column(&self) -> u32 {
        self.ordered.last().map_or(0, |(col, _)| *col)
    }

    /// Add a header; the first occurrence of a name wins.
    fn insert(&mut self, name: String, col: u32) -> bool {
        if self.by_name.contains_key(&name) {
            return false;
        }
        self.by_name.insert(name.clone(), col);
        let pos = self.ordered.partition_point(|(c, _)| *c < col);
        self.ordered.insert(pos, (col, name));
        true
    }
}

impl FromIterator<(String, u32)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        let mut map = Self::default();
        for (name, col) in iter {
            map.insert(name, col);
        }
        map
    }
}

/// Read the header row of `sheet`.
///
/// Returns the map and whether the row holds at least one non-blank text
/// cell. Numbers and booleans are mapped by their text form but do not count
/// as headers on their own. Blank cells are skipped; an empty header row is
/// not an error.
pub fn resolve_headers(sheet: &Sheet, header_row: u32) -> (HeaderMap, bool) {
    let mut headers = HeaderMap::default();
    let mut has_headers = false;

    sheet.for_each_non_empty_cell(header_row, |col, value| {
        if value.is_blank() {
            return;
        }
        if matches!(value, CellValue::String(_)) {
            has_headers = true;
        }
        let name = value.to_text();
        if !headers.insert(name.clone(), col) {
            log::warn!(
                "duplicate header {name:?} in column {col} of sheet {:?}; keeping the first",
                sheet.name
            );
        }
    });

    log::debug!(
        "resolved {} headers from row {header_row} of sheet {:?}",
        headers.len(),
        sheet.name
    );
    (headers, has_headers)
}

/// Create headers from a record's key order, writing them into `header_row`
/// at columns `1..=N`.
pub(crate) fn bootstrap_headers(sheet: &mut Sheet, header_row: u32, record: &Record) -> HeaderMap {
    let headers: HeaderMap = record.keys().cloned().zip(1u32..).collect();
    for (col, name) in headers.columns() {
        sheet.set_cell(header_row, col, CellValue::String(name.to_string()));
    }
    log::info!(
        "created {} headers in row {header_row} of sheet {:?}",
        headers.len(),
        sheet.name
    );
    headers
}
