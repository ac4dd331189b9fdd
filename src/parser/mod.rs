//! XLSX parser
//!
//! Reads the sheet list, the shared string table and each worksheet's cell
//! values out of the ZIP package. Styling, drawings and everything else is
//! left in the archive untouched and carried through on save.

mod relationships;
mod worksheet;

use std::io::Cursor;
use zip::ZipArchive;

use crate::error::Result;
use crate::types::Workbook;

use relationships::{get_sheet_info, parse_shared_strings, parse_workbook_relationships};
use worksheet::parse_sheet;

/// Parse an XLSX file from bytes.
///
/// The bytes are retained on the returned workbook so that
/// [`crate::export::save_xlsx`] can patch the original archive.
pub fn parse(data: &[u8]) -> Result<Workbook> {
    let cursor = Cursor::new(data);
    let mut archive = ZipArchive::new(cursor)?;

    let rels = parse_workbook_relationships(&mut archive);
    let sheet_infos = get_sheet_info(&mut archive, &rels.worksheets)?;
    let shared_strings = parse_shared_strings(&mut archive, rels.shared_strings.as_deref());

    let mut sheets = Vec::with_capacity(sheet_infos.len());
    for info in &sheet_infos {
        let sheet = parse_sheet(&mut archive, info, &shared_strings)?;
        log::debug!(
            "parsed sheet {:?} ({} rows x {} cols)",
            sheet.name,
            sheet.row_count(),
            sheet.column_count()
        );
        sheets.push(sheet);
    }

    Ok(Workbook {
        sheets,
        source: Some(data.to_vec()),
    })
}
