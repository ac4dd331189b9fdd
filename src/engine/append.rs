//! Append engine.

use serde::Serialize;

use crate::error::Result;
use crate::types::Sheet;

use super::header::{bootstrap_headers, resolve_headers};
use super::source::{resolve_records, DataMode, InputItem, Record};
use super::build_row;

/// Result of an append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendOutcome {
    pub rows_added: u32,
    pub sheet: String,
}

/// Append every record of every item as a new row.
///
/// When the header row is blank, headers are created once from the first
/// item's first record. Record keys without a header are dropped; headers
/// missing from a record leave a blank cell.
pub fn append(
    sheet: &mut Sheet,
    header_row: u32,
    mode: DataMode,
    items: &[InputItem],
) -> Result<AppendOutcome> {
    let (mut headers, has_headers) = resolve_headers(sheet, header_row);

    // The first item doubles as the header template, so resolve it up front
    let mut first_records: Option<Vec<Record>> = None;
    if let Some(first) = items.first() {
        let records = resolve_records(mode, first)?;
        if !has_headers {
            if let Some(template) = records.first() {
                headers = bootstrap_headers(sheet, header_row, template);
            }
        }
        first_records = Some(records);
    }

    let mut rows_added: u32 = 0;
    for (idx, item) in items.iter().enumerate() {
        let records = match (idx, first_records.take()) {
            (0, Some(records)) => records,
            _ => resolve_records(mode, item)?,
        };
        for record in &records {
            sheet.append_row(build_row(&headers, record));
            rows_added += 1;
        }
    }

    log::info!("appended {rows_added} rows to sheet {:?}", sheet.name);
    Ok(AppendOutcome {
        rows_added,
        sheet: sheet.name.clone(),
    })
}
