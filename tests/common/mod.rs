//! Common test utilities and assertion helpers.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use serde_json::Value;
use xlrelay::{
    CellValue, FileLocator, InputItem, MemoryTransport, Record, Request, Router, Sheet, Workbook,
};

/// The locator every router test stores its workbook under.
pub const FILE: &str = "books/test.xlsx";

/// Parse XLSX bytes, panicking on failure.
#[must_use]
pub fn parse(xlsx: &[u8]) -> Workbook {
    xlrelay::parser::parse(xlsx).expect("fixture should parse")
}

/// Look up a sheet by name, panicking when absent.
#[must_use]
pub fn sheet<'a>(workbook: &'a Workbook, name: &str) -> &'a Sheet {
    workbook
        .sheet(name)
        .unwrap_or_else(|| panic!("sheet {name:?} should exist"))
}

/// A row rendered as text, trailing blanks trimmed.
#[must_use]
pub fn row_text(sheet: &Sheet, row: u32) -> Vec<String> {
    let mut values: Vec<String> = sheet.row_values(row).iter().map(CellValue::to_text).collect();
    while values.last().is_some_and(String::is_empty) {
        values.pop();
    }
    values
}

/// Build a record from a JSON object literal.
#[must_use]
pub fn record(value: Value) -> Record {
    value.as_object().expect("record must be an object").clone()
}

/// One autoMap input item per JSON object.
#[must_use]
pub fn items(values: &[Value]) -> Vec<InputItem> {
    values
        .iter()
        .map(|v| InputItem::from_record(record(v.clone())))
        .collect()
}

/// A router over an in-memory store holding `xlsx` at [`FILE`].
#[must_use]
pub fn router_with(xlsx: Vec<u8>) -> Router<MemoryTransport> {
    let transport = MemoryTransport::new();
    transport.insert(FILE, xlsx);
    Router::new(transport)
}

/// Deserialize a request, filling in the test file locator.
#[must_use]
pub fn request(mut value: Value) -> Request {
    value["file"] = Value::String(FILE.to_string());
    serde_json::from_value(value).expect("request should deserialize")
}

/// Parse what the router's store currently holds.
#[must_use]
pub fn stored(router: &Router<MemoryTransport>) -> Workbook {
    let bytes = router
        .transport()
        .get(&FileLocator::new(FILE))
        .expect("file should be stored");
    parse(&bytes)
}
