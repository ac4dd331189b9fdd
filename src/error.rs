//! Structured error types for xlrelay.
//!
//! Engine errors fall into three kinds the host cares about (validation,
//! not-found, transport); the remaining variants come from the XLSX codec.

/// All errors that can occur while loading, reconciling or saving a workbook.
#[derive(Debug, thiserror::Error)]
pub enum XlrelayError {
    /// Caller or configuration mistake, raised before the offending mutation.
    #[error("{0}")]
    Validation(String),

    /// The named sheet does not exist in the loaded workbook.
    #[error("{0}")]
    NotFound(String),

    /// Download/upload failure: network, authorization or a remote lock.
    #[error("Transport error: {0}")]
    Transport(String),

    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON (de)serialization error outside of row data parsing.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Workbook structure the parser cannot make sense of.
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XlrelayError>;

impl XlrelayError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn sheet_not_found(name: &str) -> Self {
        Self::NotFound(format!("Sheet \"{name}\" not found"))
    }

    /// Whether this error was caused by the caller's parameters.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
