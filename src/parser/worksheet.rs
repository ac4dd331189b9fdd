//! Worksheet parsing - reads `<sheetData>` cell values into a [`Sheet`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufReader, Read};
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::Result;
use crate::types::{Cell, CellValue, Formula, Sheet};

/// Sheet metadata from workbook.xml
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Date,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        b"d" => CellTypeTag::Date,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    seen.then_some(num)
}

/// Which text node we are currently collecting.
#[derive(Copy, Clone, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
    InlineText,
}

/// A `<c>` element being assembled.
struct PendingCell {
    row: u32,
    col: u32,
    tag: CellTypeTag,
    style_idx: Option<u32>,
    value: Option<String>,
    formula: Option<Formula>,
}

impl PendingCell {
    fn from_element(e: &BytesStart<'_>, current_row: u32, next_col: u32) -> Self {
        let mut pending = Self {
            row: current_row,
            col: next_col,
            tag: CellTypeTag::Default,
            style_idx: None,
            value: None,
            formula: None,
        };
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"r" => {
                    if let Some((row, col)) = parse_cell_ref_bytes(&attr.value) {
                        pending.row = row;
                        pending.col = col;
                    }
                }
                b"t" => pending.tag = parse_cell_type_tag(&attr.value),
                b"s" => pending.style_idx = parse_u32_bytes(&attr.value),
                _ => {}
            }
        }
        pending
    }

    fn into_cell(self, shared_strings: &[String]) -> Cell {
        let value = match (self.tag, self.value) {
            (_, None) => CellValue::Empty,
            (CellTypeTag::Shared, Some(v)) => {
                let resolved = v
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| shared_strings.get(idx));
                match resolved {
                    Some(s) => CellValue::String(s.clone()),
                    None => {
                        log::warn!(
                            "shared string index {v:?} out of range at row {} col {}",
                            self.row,
                            self.col
                        );
                        CellValue::Empty
                    }
                }
            }
            (CellTypeTag::Inline | CellTypeTag::Str | CellTypeTag::Date, Some(v)) => {
                CellValue::String(v)
            }
            (CellTypeTag::Bool, Some(v)) => CellValue::Boolean(v.trim() == "1"),
            (CellTypeTag::Error, Some(v)) => CellValue::Error(v),
            (CellTypeTag::Default, Some(v)) => match v.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => {
                    log::warn!(
                        "non-numeric value {v:?} in numeric cell at row {} col {}",
                        self.row,
                        self.col
                    );
                    CellValue::String(v)
                }
            },
        };
        Cell {
            value,
            style_idx: self.style_idx,
            formula: self.formula,
        }
    }
}

fn formula_attrs(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.attributes_raw()).into_owned()
}

/// Parse a single worksheet's cell data.
pub(super) fn parse_sheet<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    shared_strings: &[String],
) -> Result<Sheet> {
    let file = archive.by_name(&info.path)?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut sheet = Sheet::with_path(&info.name, &info.path);

    let mut buf = Vec::new();
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 1;
    let mut pending: Option<PendingCell> = None;
    let mut target = TextTarget::None;
    let mut in_inline = false;
    let mut in_phonetic = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = row_number(e).unwrap_or(current_row + 1);
                    next_col = 1;
                }
                b"c" => {
                    pending = Some(PendingCell::from_element(e, current_row, next_col));
                }
                b"v" if pending.is_some() => target = TextTarget::Value,
                b"f" => {
                    if let Some(p) = pending.as_mut() {
                        p.formula = Some(Formula {
                            text: String::new(),
                            attrs: formula_attrs(e),
                        });
                        target = TextTarget::Formula;
                    }
                }
                b"is" => in_inline = true,
                // Phonetic hints inside inline strings are not cell text
                b"rPh" => in_phonetic = true,
                b"t" if in_inline && !in_phonetic => target = TextTarget::InlineText,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = row_number(e).unwrap_or(current_row + 1);
                    next_col = 1;
                }
                b"c" => {
                    // Self-closing cells carry only a style
                    let cell = PendingCell::from_element(e, current_row, next_col);
                    next_col = cell.col + 1;
                    if cell.style_idx.is_some() {
                        let (row, col) = (cell.row, cell.col);
                        sheet.load_cell(row, col, cell.into_cell(shared_strings));
                    }
                }
                b"f" => {
                    if let Some(p) = pending.as_mut() {
                        p.formula = Some(Formula {
                            text: String::new(),
                            attrs: formula_attrs(e),
                        });
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if target != TextTarget::None => {
                let text = e.unescape()?;
                if let Some(p) = pending.as_mut() {
                    match target {
                        TextTarget::Value | TextTarget::InlineText => {
                            p.value.get_or_insert_with(String::new).push_str(&text);
                        }
                        TextTarget::Formula => {
                            if let Some(f) = p.formula.as_mut() {
                                f.text.push_str(&text);
                            }
                        }
                        TextTarget::None => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"v" | b"f" | b"t" => target = TextTarget::None,
                b"is" => in_inline = false,
                b"rPh" => in_phonetic = false,
                b"c" => {
                    if let Some(cell) = pending.take() {
                        next_col = cell.col + 1;
                        let (row, col) = (cell.row, cell.col);
                        let cell = cell.into_cell(shared_strings);
                        if !cell.value.is_empty() || cell.style_idx.is_some() || cell.formula.is_some() {
                            sheet.load_cell(row, col, cell);
                        }
                    }
                    target = TextTarget::None;
                    in_inline = false;
                }
                b"sheetData" => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheet)
}

fn row_number(e: &BytesStart<'_>) -> Option<u32> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"r")
        .and_then(|attr| parse_u32_bytes(&attr.value))
        .filter(|&r| r > 0)
}
