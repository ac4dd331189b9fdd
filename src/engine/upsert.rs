//! Upsert engine: update rows matched by a composite key, append the rest.

use serde::Serialize;
use std::collections::HashMap;

use crate::error::{Result, XlrelayError};
use crate::types::{CellValue, Sheet};

use super::header::{resolve_headers, HeaderMap};
use super::source::{resolve_records, DataMode, InputItem, Record};
use super::build_row;

/// Key column values of one row or record, in key column order.
///
/// Parts are compared as a list, so a `|` or any other character inside a
/// value cannot make two different keys collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey(Vec<String>);

impl CompositeKey {
    /// True when every part is the empty string. Such keys never match.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(String::is_empty)
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for CompositeKey {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOutcome {
    pub rows_updated: u32,
    pub rows_appended: u32,
    pub sheet: String,
}

/// Knobs for [`upsert`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOptions {
    /// Register rows appended during this call in the key index, so a later
    /// record with the same new key updates that row instead of appending a
    /// duplicate. Off by default: every unmatched record appends.
    pub index_new_rows: bool,
}

/// Composite key to existing row number, built from the rows below the
/// header. Blank keys are never stored.
#[derive(Debug, Default)]
pub struct KeyIndex {
    rows: HashMap<CompositeKey, u32>,
}

impl KeyIndex {
    pub fn build(sheet: &Sheet, header_row: u32, key_positions: &[u32]) -> Self {
        let mut index = Self::default();
        for row in header_row.saturating_add(1)..=sheet.row_count() {
            let key: CompositeKey = key_positions
                .iter()
                .map(|&col| sheet.value(row, col).to_text())
                .collect();
            // Later duplicates win, matching a plain map assignment
            index.insert(key, row);
        }
        index
    }

    pub fn get(&self, key: &CompositeKey) -> Option<u32> {
        self.rows.get(key).copied()
    }

    /// Map `key` to `row`. Returns false and stores nothing for a blank key.
    pub fn insert(&mut self, key: CompositeKey, row: u32) -> bool {
        if key.is_blank() {
            return false;
        }
        self.rows.insert(key, row);
        true
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build the composite key of a record.
///
/// Fails when a key column is absent or `null` in the record.
pub fn record_key(record: &Record, key_columns: &[String]) -> Result<CompositeKey> {
    key_columns
        .iter()
        .map(|name| match record.get(name) {
            Some(value) if !value.is_null() => Ok(CellValue::from_json(value).to_text()),
            _ => Err(XlrelayError::validation(format!(
                "Row data missing key column \"{name}\" value"
            ))),
        })
        .collect::<Result<Vec<_>>>()
        .map(CompositeKey)
}

/// Map key column names to header positions.
pub(crate) fn key_positions(headers: &HeaderMap, key_columns: &[String]) -> Result<Vec<u32>> {
    if key_columns.is_empty() {
        return Err(XlrelayError::validation(
            "Key Column is required for upsert operation",
        ));
    }
    key_columns
        .iter()
        .map(|name| {
            headers.position(name).ok_or_else(|| {
                XlrelayError::validation(format!("Key column \"{name}\" not found in headers"))
            })
        })
        .collect()
}

/// Update-or-append every record of every item, matching on `key_columns`.
///
/// The header row must already exist. Each item's records are validated in
/// full before any of them is written.
pub fn upsert(
    sheet: &mut Sheet,
    header_row: u32,
    mode: DataMode,
    key_columns: &[String],
    items: &[InputItem],
    options: UpsertOptions,
) -> Result<UpsertOutcome> {
    let (headers, _) = resolve_headers(sheet, header_row);
    let positions = key_positions(&headers, key_columns)?;

    let mut index = KeyIndex::build(sheet, header_row, &positions);
    log::debug!(
        "indexed {} keyed rows in sheet {:?} on {:?}",
        index.len(),
        sheet.name,
        key_columns
    );

    let mut rows_updated: u32 = 0;
    let mut rows_appended: u32 = 0;

    for item in items {
        let records = resolve_records(mode, item)?;
        let keyed = records
            .iter()
            .map(|record| record_key(record, key_columns).map(|key| (key, record)))
            .collect::<Result<Vec<_>>>()?;

        for (key, record) in keyed {
            if let Some(row) = index.get(&key) {
                update_row(sheet, &headers, row, record);
                rows_updated += 1;
            } else {
                let row = sheet.append_row(build_row(&headers, record));
                if options.index_new_rows {
                    index.insert(key, row);
                }
                rows_appended += 1;
            }
        }
    }

    log::info!(
        "upserted sheet {:?}: {rows_updated} updated, {rows_appended} appended",
        sheet.name
    );
    Ok(UpsertOutcome {
        rows_updated,
        rows_appended,
        sheet: sheet.name.clone(),
    })
}

/// Overwrite the mapped cells of an existing row; unmapped keys are dropped.
fn update_row(sheet: &mut Sheet, headers: &HeaderMap, row: u32, record: &Record) {
    for (name, value) in record {
        if let Some(col) = headers.position(name) {
            sheet.set_cell(row, col, CellValue::from_json(value));
        }
    }
}
