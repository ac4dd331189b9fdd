//! XLSX export pipeline.
//!
//! Produces a modified XLSX by patching the original ZIP archive.
//! Only dirty (edited) sheets are re-serialized; everything else is
//! passed through byte-identical.

pub(crate) mod sheet_writer;
pub(crate) mod zip_patcher;

use crate::error::{Result, XlrelayError};
use crate::types::Workbook;

/// Save a workbook to XLSX bytes.
///
/// The workbook must come from [`crate::parser::parse`], whose original
/// bytes are needed for the ZIP roundtrip.
pub fn save_xlsx(workbook: &Workbook) -> Result<Vec<u8>> {
    let original_bytes = workbook.source.as_deref().ok_or_else(|| {
        XlrelayError::Parse("workbook has no source archive to patch".to_string())
    })?;

    if !workbook.is_dirty() {
        // Nothing changed, hand back the original bytes
        return Ok(original_bytes.to_vec());
    }

    zip_patcher::patch_zip(original_bytes, workbook)
}
