//! Regenerates worksheet cell data for a modified `Sheet`.
//!
//! Only `<sheetData>` and `<dimension>` are rewritten; column widths,
//! merges, conditional formats and everything else in the original
//! worksheet XML are spliced back around them unchanged. String cells use
//! inline strings (`t="inlineStr"`) so the shared string table never needs
//! rebuilding.

use crate::cell_ref::{col_to_letter, to_cell_ref};
use crate::error::{Result, XlrelayError};
use crate::types::{Cell, CellValue, Sheet};

/// Rewrite `original` (a worksheet part) with the sheet's current cells.
pub(crate) fn splice_sheet_xml(original: &str, sheet: &Sheet) -> Result<String> {
    let (start, prefix) = find_element_start(original, "sheetData").ok_or_else(|| {
        XlrelayError::Parse(format!(
            "worksheet {} has no <sheetData> element",
            sheet.path
        ))
    })?;
    let end = element_end(original, start, &prefix, "sheetData").ok_or_else(|| {
        XlrelayError::Parse(format!("worksheet {} has an unterminated <sheetData>", sheet.path))
    })?;

    let mut out = String::with_capacity(original.len() + 1024);
    let (head, rest) = original.split_at(start);
    let tail = rest.get(end - start..).unwrap_or("");

    out.push_str(&replace_dimension(head, &prefix, sheet));
    write_sheet_data(&mut out, sheet, &prefix);
    out.push_str(tail);
    Ok(out)
}

/// Locate `<{prefix}{local}` and return its byte offset and prefix.
fn find_element_start(xml: &str, local: &str) -> Option<(usize, String)> {
    let mut from = 0;
    while let Some(rel) = xml.get(from..)?.find(local) {
        let idx = from + rel;
        let after = xml.as_bytes().get(idx + local.len()).copied();
        let name_ends = matches!(after, Some(b' ' | b'>' | b'/' | b'\t' | b'\r' | b'\n'));
        if name_ends {
            let before = xml.get(..idx)?;
            if before.ends_with('<') {
                return Some((idx - 1, String::new()));
            }
            if before.ends_with(':') {
                if let Some(lt) = before.rfind('<') {
                    let prefix = before.get(lt + 1..)?;
                    if !prefix.contains(|c: char| c.is_whitespace() || c == '>' || c == '/') {
                        return Some((lt, prefix.to_string()));
                    }
                }
            }
        }
        from = idx + local.len();
    }
    None
}

/// Byte offset just past the element starting at `start`.
fn element_end(xml: &str, start: usize, prefix: &str, local: &str) -> Option<usize> {
    let gt = start + xml.get(start..)?.find('>')?;
    if xml.as_bytes().get(gt.checked_sub(1)?) == Some(&b'/') {
        return Some(gt + 1);
    }
    let close = format!("</{prefix}{local}>");
    let close_idx = gt + xml.get(gt..)?.find(&close)?;
    Some(close_idx + close.len())
}

fn dimension_ref(sheet: &Sheet) -> String {
    if sheet.row_count() == 0 || sheet.column_count() == 0 {
        return "A1".to_string();
    }
    format!(
        "A1:{}{}",
        col_to_letter(sheet.column_count()),
        sheet.row_count()
    )
}

/// Replace the `<dimension>` element (if any) in the part before `<sheetData>`.
fn replace_dimension(head: &str, prefix: &str, sheet: &Sheet) -> String {
    let Some((start, _)) = find_element_start(head, "dimension") else {
        return head.to_string();
    };
    let Some(end) = element_end(head, start, prefix, "dimension") else {
        return head.to_string();
    };
    let mut out = String::with_capacity(head.len() + 16);
    out.push_str(head.get(..start).unwrap_or(""));
    out.push_str(&format!(
        "<{prefix}dimension ref=\"{}\"/>",
        dimension_ref(sheet)
    ));
    out.push_str(head.get(end..).unwrap_or(""));
    out
}

/// Write all cell rows as a `<sheetData>` element.
pub(crate) fn write_sheet_data(out: &mut String, sheet: &Sheet, prefix: &str) {
    let mut rows = sheet.stored_rows().peekable();
    if rows.peek().is_none() {
        out.push_str(&format!("<{prefix}sheetData/>"));
        return;
    }

    out.push_str(&format!("<{prefix}sheetData>"));
    for (row, cells) in rows {
        out.push_str(&format!("<{prefix}row r=\"{row}\">"));
        for (&col, cell) in cells {
            write_cell(out, prefix, row, col, cell);
        }
        out.push_str(&format!("</{prefix}row>"));
    }
    out.push_str(&format!("</{prefix}sheetData>"));
}

/// Write a single `<c>` element.
fn write_cell(out: &mut String, prefix: &str, row: u32, col: u32, cell: &Cell) {
    out.push_str(&format!("<{prefix}c r=\"{}\"", to_cell_ref(row, col)));
    if let Some(si) = cell.style_idx {
        out.push_str(&format!(" s=\"{si}\""));
    }

    let has_formula = cell.formula.is_some();
    match &cell.value {
        CellValue::Empty if !has_formula => {
            out.push_str("/>");
            return;
        }
        CellValue::Empty => out.push('>'),
        // Formula results are cached as plain strings
        CellValue::String(_) if has_formula => out.push_str(" t=\"str\">"),
        CellValue::String(_) => out.push_str(" t=\"inlineStr\">"),
        CellValue::Number(_) => out.push('>'),
        CellValue::Boolean(_) => out.push_str(" t=\"b\">"),
        CellValue::Error(_) => out.push_str(" t=\"e\">"),
    }

    if let Some(f) = &cell.formula {
        if f.text.is_empty() {
            out.push_str(&format!("<{prefix}f{}/>", f.attrs));
        } else {
            out.push_str(&format!("<{prefix}f{}>{}</{prefix}f>", f.attrs, xml_escape(&f.text)));
        }
    }

    match &cell.value {
        CellValue::Empty => {}
        CellValue::String(s) if has_formula => {
            out.push_str(&format!("<{prefix}v>{}</{prefix}v>", xml_escape(s)));
        }
        CellValue::String(s) => {
            let space = if needs_space_preserve(s) {
                " xml:space=\"preserve\""
            } else {
                ""
            };
            out.push_str(&format!(
                "<{prefix}is><{prefix}t{space}>{}</{prefix}t></{prefix}is>",
                xml_escape(s)
            ));
        }
        CellValue::Number(n) => out.push_str(&format!("<{prefix}v>{n}</{prefix}v>")),
        CellValue::Boolean(b) => {
            let v = if *b { "1" } else { "0" };
            out.push_str(&format!("<{prefix}v>{v}</{prefix}v>"));
        }
        CellValue::Error(e) => {
            out.push_str(&format!("<{prefix}v>{}</{prefix}v>", xml_escape(e)));
        }
    }

    out.push_str(&format!("</{prefix}c>"));
}

fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) || s.contains('\n')
}

/// Minimal XML escaping for attribute/text content.
fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::Formula;

    fn sample_sheet() -> Sheet {
        let mut sheet = Sheet::with_path("Data", "xl/worksheets/sheet1.xml");
        sheet.set_cell(1, 1, CellValue::String("Name".into()));
        sheet.set_cell(1, 2, CellValue::String(" padded <b> ".into()));
        sheet.set_cell(2, 1, CellValue::Number(42.0));
        sheet.set_cell(2, 2, CellValue::Boolean(true));
        sheet
    }

    #[test]
    fn test_write_cells() {
        let mut out = String::new();
        write_sheet_data(&mut out, &sample_sheet(), "");
        assert!(out.starts_with("<sheetData><row r=\"1\">"));
        assert!(out.contains("<c r=\"A1\" t=\"inlineStr\"><is><t>Name</t></is></c>"));
        assert!(out.contains(
            "<c r=\"B1\" t=\"inlineStr\"><is><t xml:space=\"preserve\"> padded &lt;b&gt; </t></is></c>"
        ));
        assert!(out.contains("<c r=\"A2\"><v>42</v></c>"));
        assert!(out.contains("<c r=\"B2\" t=\"b\"><v>1</v></c>"));
        assert!(out.ends_with("</row></sheetData>"));
    }

    #[test]
    fn test_write_formula_and_styled_blank() {
        let mut sheet = Sheet::with_path("Data", "xl/worksheets/sheet1.xml");
        sheet.load_cell(
            1,
            1,
            Cell {
                value: CellValue::Number(3.0),
                style_idx: Some(2),
                formula: Some(Formula {
                    text: "A2+1".into(),
                    attrs: String::new(),
                }),
            },
        );
        sheet.load_cell(
            1,
            2,
            Cell {
                style_idx: Some(5),
                ..Cell::default()
            },
        );
        let mut out = String::new();
        write_sheet_data(&mut out, &sheet, "");
        assert!(out.contains("<c r=\"A1\" s=\"2\"><f>A2+1</f><v>3</v></c>"));
        assert!(out.contains("<c r=\"B1\" s=\"5\"/>"));
    }

    #[test]
    fn test_splice_keeps_surrounding_xml() {
        let original = r#"<?xml version="1.0"?><worksheet><dimension ref="A1"/><cols><col min="1" max="1" width="20"/></cols><sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData><mergeCells count="1"><mergeCell ref="C1:D1"/></mergeCells></worksheet>"#;
        let xml = splice_sheet_xml(original, &sample_sheet()).unwrap();

        assert!(xml.contains("<dimension ref=\"A1:B2\"/>"));
        assert!(xml.contains("<cols><col min=\"1\" max=\"1\" width=\"20\"/></cols><sheetData><row"));
        assert!(xml.contains("</sheetData><mergeCells count=\"1\">"));
        assert!(!xml.contains("<v>1</v>"));
    }

    #[test]
    fn test_splice_self_closing_and_prefixed() {
        let original = r#"<x:worksheet xmlns:x="urn:x"><x:sheetData/></x:worksheet>"#;
        let xml = splice_sheet_xml(original, &sample_sheet()).unwrap();
        assert!(xml.starts_with("<x:worksheet xmlns:x=\"urn:x\"><x:sheetData><x:row r=\"1\">"));
        assert!(xml.ends_with("</x:sheetData></x:worksheet>"));
    }

    #[test]
    fn test_splice_empty_sheet() {
        let original = "<worksheet><sheetData><row r=\"1\"/></sheetData></worksheet>";
        let sheet = Sheet::with_path("Data", "xl/worksheets/sheet1.xml");
        let xml = splice_sheet_xml(original, &sheet).unwrap();
        assert_eq!(xml, "<worksheet><sheetData/></worksheet>");
    }

    #[test]
    fn test_splice_without_sheet_data_fails() {
        let sheet = Sheet::with_path("Data", "xl/worksheets/sheet1.xml");
        let err = splice_sheet_xml("<worksheet/>", &sheet).unwrap_err();
        assert!(err.to_string().contains("no <sheetData>"));
    }
}
