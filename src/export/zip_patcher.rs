//! Patch an XLSX ZIP archive with modified sheet XML.
//!
//! Unmodified entries are copied via `raw_copy_file` (zero recompression cost).
//! Only dirty sheets get their cell data regenerated.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::Result;
use crate::types::{Sheet, Workbook};

use super::sheet_writer::splice_sheet_xml;

/// Patch the original XLSX bytes, replacing only dirty sheets.
///
/// Returns the new XLSX file as `Vec<u8>`.
pub(crate) fn patch_zip(original_data: &[u8], workbook: &Workbook) -> Result<Vec<u8>> {
    let cursor = Cursor::new(original_data);
    let mut archive = ZipArchive::new(cursor)?;

    // ZIP paths that need replacement
    let dirty: HashMap<&str, &Sheet> = workbook
        .sheets
        .iter()
        .filter(|s| s.is_dirty())
        .map(|s| (s.path.as_str(), s))
        .collect();

    let buf: Vec<u8> = Vec::with_capacity(original_data.len());
    let mut writer = ZipWriter::new(Cursor::new(buf));

    for i in 0..archive.len() {
        let name = archive.by_index_raw(i)?.name().to_string();

        if let Some(sheet) = dirty.get(name.as_str()) {
            let mut original = String::new();
            archive.by_index(i)?.read_to_string(&mut original)?;
            let xml = splice_sheet_xml(&original, sheet)?;
            let options =
                FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
            writer.start_file(name.as_str(), options)?;
            writer.write_all(xml.as_bytes())?;
            log::debug!("rewrote {name} for sheet {:?}", sheet.name);
            continue;
        }

        // Pass through unmodified entry (raw copy, no re-compression)
        writer.raw_copy_file(archive.by_index_raw(i)?)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}
