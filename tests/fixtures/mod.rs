//! Test fixtures for generating valid XLSX files in memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtures::{SheetBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("Orders")
//!             .row(1, &["ID".into(), "Name".into()])
//!             .cell("A2", "A1")
//!             .cell("B2", 42.0),
//!     )
//!     .build();
//!
//! let workbook = xlrelay::parser::parse(&xlsx).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation,
    clippy::cast_lossless
)]

use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

/// Style index of a bold cell in the generated `styles.xml`.
pub const STYLE_BOLD: u32 = 1;
/// Style index of a date-formatted cell in the generated `styles.xml`.
pub const STYLE_DATE: u32 = 2;

// ============================================================================
// Cell Value
// ============================================================================

/// Represents a cell value that can be added to a sheet.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// A shared string.
    String(String),
    /// An inline string (not shared).
    InlineString(String),
    Number(f64),
    Boolean(bool),
    /// An error value (e.g., "#DIV/0!").
    Error(String),
    /// A formula with its cached numeric result.
    Formula(String, f64),
    /// An empty cell (style only).
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
    pub style: Option<u32>,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    /// Worksheet XML used verbatim instead of the generated one.
    pub raw_xml: Option<String>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cell<V: Into<CellValue>>(mut self, cell_ref: &str, value: V) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style: None,
        });
        self
    }

    #[must_use]
    pub fn styled<V: Into<CellValue>>(mut self, cell_ref: &str, value: V, style: u32) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style: Some(style),
        });
        self
    }

    /// Fill one row from column A.
    #[must_use]
    pub fn row(mut self, row: u32, values: &[CellValue]) -> Self {
        for (idx, value) in values.iter().enumerate() {
            let cell_ref = format!("{}{row}", col_letter(idx as u32 + 1));
            self.cells.push(CellEntry {
                cell_ref,
                value: value.clone(),
                style: None,
            });
        }
        self
    }

    #[must_use]
    pub fn raw_xml(mut self, xml: &str) -> Self {
        self.raw_xml = Some(xml.to_string());
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for creating complete XLSX files.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    extra_parts: Vec<(String, String)>,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Add an arbitrary part, e.g. `docProps/custom.xml`.
    #[must_use]
    pub fn part(mut self, path: &str, content: &str) -> Self {
        self.extra_parts.push((path.to_string(), content.to_string()));
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let CellValue::String(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let mut write = |path: &str, content: &str| {
            zip.start_file(path, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        };

        write(
            "[Content_Types].xml",
            &generate_content_types(self.sheets.len()),
        );
        write("_rels/.rels", RELS);
        write(
            "xl/_rels/workbook.xml.rels",
            &generate_workbook_rels(self.sheets.len()),
        );
        write("xl/workbook.xml", &generate_workbook(&self.sheets));
        write("xl/styles.xml", STYLES);
        write(
            "xl/sharedStrings.xml",
            &generate_shared_strings(&shared_strings),
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            let path = format!("xl/worksheets/sheet{}.xml", i + 1);
            let xml = sheet
                .raw_xml
                .clone()
                .unwrap_or_else(|| generate_sheet_xml(sheet, &shared_strings));
            write(&path, &xml);
        }
        for (path, content) in &self.extra_parts {
            write(path, content);
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

/// One-sheet workbook with a header row and the given data rows.
#[must_use]
pub fn table_xlsx(sheet: &str, headers: &[&str], rows: &[Vec<CellValue>]) -> Vec<u8> {
    let header_values: Vec<CellValue> = headers.iter().map(|h| CellValue::from(*h)).collect();
    let mut builder = SheetBuilder::new(sheet).row(1, &header_values);
    for (idx, row) in rows.iter().enumerate() {
        builder = builder.row(idx as u32 + 2, row);
    }
    XlsxBuilder::new().sheet(builder).build()
}

// ============================================================================
// Archive inspection
// ============================================================================

/// Read one entry of an XLSX archive as text.
#[must_use]
pub fn read_part(xlsx: &[u8], path: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(xlsx)).unwrap();
    let mut file = archive.by_name(path).unwrap();
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    out
}

/// Entry names in archive order.
#[must_use]
pub fn part_names(xlsx: &[u8]) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(xlsx)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

// ============================================================================
// XML generation
// ============================================================================

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="1"><fill><patternFill patternType="none"/></fill></fills><borders count="1"><border/></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

fn col_letter(col: u32) -> String {
    let mut out = String::new();
    let mut n = col;
    while n > 0 {
        n -= 1;
        out.insert(0, char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    out
}

fn split_ref(cell_ref: &str) -> (String, u32) {
    let letters: String = cell_ref.chars().take_while(char::is_ascii_alphabetic).collect();
    let row = cell_ref[letters.len()..].parse().unwrap();
    (letters, row)
}

fn col_number(letters: &str) -> u32 {
    letters
        .bytes()
        .fold(0, |acc, b| acc * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1)
}

/// Escape XML special characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    let n = sheet_count + 1;
    xml.push_str(&format!(
        r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#
    ));
    let n = sheet_count + 2;
    xml.push_str(&format!(
        r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#
    ));
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#);
    for (i, sheet) in sheets.iter().enumerate() {
        let id = i + 1;
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{id}" r:id="rId{id}"/>"#,
            escape_xml(&sheet.name)
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!(r#"<si><t xml:space="preserve">{}</t></si>"#, escape_xml(s)));
    }
    xml.push_str("</sst>");
    xml
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String]) -> String {
    let mut cells: Vec<(u32, u32, &CellEntry)> = sheet
        .cells
        .iter()
        .map(|c| {
            let (letters, row) = split_ref(&c.cell_ref);
            (row, col_number(&letters), c)
        })
        .collect();
    cells.sort_by_key(|(row, col, _)| (*row, *col));

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str(r#"<dimension ref="A1"/>"#);
    xml.push_str(r#"<sheetViews><sheetView workbookViewId="0"/></sheetViews>"#);
    xml.push_str(r#"<cols><col min="1" max="1" width="18" customWidth="1"/></cols>"#);
    xml.push_str("<sheetData>");

    let mut current_row = 0;
    for (row, _, cell) in cells {
        if row != current_row {
            if current_row != 0 {
                xml.push_str("</row>");
            }
            xml.push_str(&format!(r#"<row r="{row}">"#));
            current_row = row;
        }
        let style = cell.style.map(|s| format!(r#" s="{s}""#)).unwrap_or_default();
        let r = &cell.cell_ref;
        match &cell.value {
            CellValue::String(s) => {
                let idx = shared_strings.iter().position(|x| x == s).unwrap();
                xml.push_str(&format!(r#"<c r="{r}"{style} t="s"><v>{idx}</v></c>"#));
            }
            CellValue::InlineString(s) => xml.push_str(&format!(
                r#"<c r="{r}"{style} t="inlineStr"><is><t>{}</t></is></c>"#,
                escape_xml(s)
            )),
            CellValue::Number(n) => xml.push_str(&format!(r#"<c r="{r}"{style}><v>{n}</v></c>"#)),
            CellValue::Boolean(b) => xml.push_str(&format!(
                r#"<c r="{r}"{style} t="b"><v>{}</v></c>"#,
                u8::from(*b)
            )),
            CellValue::Error(e) => xml.push_str(&format!(
                r#"<c r="{r}"{style} t="e"><v>{}</v></c>"#,
                escape_xml(e)
            )),
            CellValue::Formula(f, cached) => xml.push_str(&format!(
                r#"<c r="{r}"{style}><f>{}</f><v>{cached}</v></c>"#,
                escape_xml(f)
            )),
            CellValue::Empty => xml.push_str(&format!(r#"<c r="{r}"{style}/>"#)),
        }
    }
    if current_row != 0 {
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData>");
    xml.push_str(r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#);
    xml.push_str("</worksheet>");
    xml
}
