//! Row reconciliation between input records and a sheet's header layout.
//!
//! Everything here works on an in-memory [`Sheet`]; loading and saving the
//! workbook is the router's job. Derived structures (header map, key index)
//! are rebuilt on every call because the workbook itself is re-fetched whole.

pub mod append;
pub mod header;
pub mod ops;
pub mod source;
pub mod upsert;

pub use append::{append, AppendOutcome};
pub use header::{resolve_headers, HeaderMap};
pub use source::{
    resolve_key_columns, resolve_records, ColumnMapping, DataMode, InputItem, Record,
};
pub use upsert::{upsert, CompositeKey, KeyIndex, UpsertOptions, UpsertOutcome};

use crate::types::{CellValue, Sheet};

/// Lay a record out as a row buffer following `headers`.
///
/// Keys without a header are dropped, headers absent from the record stay
/// empty.
pub(crate) fn build_row(headers: &HeaderMap, record: &Record) -> Vec<CellValue> {
    let width = usize::try_from(headers.last_column()).unwrap_or(0);
    let mut row = vec![CellValue::Empty; width];
    for (name, value) in record {
        let Some(col) = headers.position(name) else {
            continue;
        };
        let slot = usize::try_from(col)
            .ok()
            .and_then(|c| c.checked_sub(1))
            .and_then(|idx| row.get_mut(idx));
        if let Some(slot) = slot {
            *slot = CellValue::from_json(value);
        }
    }
    row
}

/// Shorthand used by the router and tests.
pub(crate) fn sheet_mut<'a>(
    workbook: &'a mut crate::types::Workbook,
    name: &str,
) -> crate::error::Result<&'a mut Sheet> {
    workbook
        .sheet_mut(name)
        .ok_or_else(|| crate::error::XlrelayError::sheet_not_found(name))
}
