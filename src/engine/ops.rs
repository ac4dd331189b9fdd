//! Thin sheet operations that sit next to append and upsert: reading rows
//! back, clearing, deleting and single-cell edits.

use serde_json::Value;

use crate::cell_ref::{parse_cell_ref, to_cell_ref};
use crate::error::{Result, XlrelayError};
use crate::types::{CellValue, Sheet, Workbook};

use super::header::resolve_headers;
use super::source::Record;

pub fn list_sheets(workbook: &Workbook) -> Vec<String> {
    workbook.sheet_names()
}

/// Header names in column order.
pub fn get_columns(sheet: &Sheet, header_row: u32) -> Vec<String> {
    let (headers, _) = resolve_headers(sheet, header_row);
    headers.names().map(str::to_string).collect()
}

/// Read the data rows below the header as records.
///
/// Reading starts at `start_row` (never above the first data row). Rows with
/// no values are skipped and do not count towards `limit`. Empty cells under
/// a header read as `null`.
pub fn read_rows(
    sheet: &Sheet,
    header_row: u32,
    start_row: Option<u32>,
    limit: Option<usize>,
) -> Vec<Record> {
    let (headers, _) = resolve_headers(sheet, header_row);
    let first = header_row
        .saturating_add(1)
        .max(start_row.unwrap_or(0));
    let limit = limit.unwrap_or(usize::MAX);

    let mut records = Vec::new();
    for row in first..=sheet.row_count() {
        if records.len() >= limit {
            break;
        }
        if sheet.is_row_empty(row) {
            continue;
        }
        let record: Record = headers
            .columns()
            .map(|(col, name)| (name.to_string(), sheet.value(row, col).to_json()))
            .collect();
        records.push(record);
    }
    log::debug!("read {} rows from sheet {:?}", records.len(), sheet.name);
    records
}

/// Clear every row below the header, or the whole sheet when `keep_headers`
/// is false. Returns the number of non-empty rows cleared.
pub fn clear(sheet: &mut Sheet, header_row: u32, keep_headers: bool) -> u32 {
    let from = if keep_headers {
        header_row.saturating_add(1)
    } else {
        1
    };
    let cleared = sheet.clear_rows_from(from);
    log::info!("cleared {cleared} rows from sheet {:?}", sheet.name);
    cleared
}

/// Delete `count` rows from `start_row`, shifting later rows up.
pub fn delete_rows(sheet: &mut Sheet, start_row: u32, count: u32) -> Result<u32> {
    if start_row == 0 {
        return Err(XlrelayError::validation(
            "Start row must be a positive integer",
        ));
    }
    let deleted = sheet.delete_rows(start_row, count);
    log::info!(
        "deleted {deleted} rows at {start_row} from sheet {:?}",
        sheet.name
    );
    Ok(deleted)
}

/// Write one cell addressed by an A1 reference.
///
/// String values are typed the way a user typing into the cell would see
/// them (`"42"` becomes a number, `"true"` a boolean, `""` clears the cell).
/// Returns the normalized reference.
pub fn update_cell(sheet: &mut Sheet, cell_ref: &str, value: &Value) -> Result<String> {
    let (row, col) = parse_cell_ref(cell_ref.trim()).ok_or_else(|| {
        XlrelayError::validation(format!("Invalid cell reference: {cell_ref}"))
    })?;
    let value = match value {
        Value::String(text) => CellValue::detect(text),
        other => CellValue::from_json(other),
    };
    sheet.set_cell(row, col, value);
    Ok(to_cell_ref(row, col))
}
