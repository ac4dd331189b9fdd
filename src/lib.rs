//! xlrelay - whole-file XLSX round trips for workflow hosts
//!
//! Downloads a workbook, edits it in memory and uploads it again:
//! - Header-aware append with one-time header bootstrap
//! - Upsert keyed on one or more columns
//! - Three row sources: the item itself, a manual mapping, or raw JSON
//! - Untouched parts of the archive are copied byte for byte on save
//!
//! # Usage
//!
//! ```rust,ignore
//! use xlrelay::{FsTransport, Request, Router};
//!
//! let router = Router::new(FsTransport::new("/srv/books"));
//! let request: Request = serde_json::from_str(r#"{
//!     "resource": "sheet", "operation": "append",
//!     "file": "q1.xlsx", "sheet": "Orders"
//! }"#)?;
//! let result = router.execute(&request, &items)?;
//! ```

pub mod cell_ref;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod parser;
pub mod router;
pub mod transport;
pub mod types;

pub use engine::{
    append, resolve_headers, resolve_key_columns, resolve_records, upsert, AppendOutcome,
    ColumnMapping, DataMode, HeaderMap, InputItem, Record, UpsertOptions, UpsertOutcome,
};
pub use error::{Result, XlrelayError};
pub use router::{OperationKind, Request, Resource, Router, SheetLocator};
pub use transport::{FileLocator, FsTransport, MemoryTransport, Transport, WorkbookSession};
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use types::*;

/// Get the library version
#[must_use]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
