//! Whole-file transports.
//!
//! A transport moves the raw XLSX bytes of one remote file; it knows nothing
//! about spreadsheets. [`WorkbookSession`] puts the parser and the export
//! pipeline on either side of it.

mod fs;
#[cfg(feature = "http")]
mod http;
mod memory;

pub use fs::FsTransport;
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use memory::MemoryTransport;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::export::save_xlsx;
use crate::parser::parse;
use crate::types::Workbook;

/// Opaque identifier of a remote file (a relative path, a drive item id...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileLocator(String);

impl FileLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileLocator {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FileLocator {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Download and upload of whole files.
///
/// Every failure is reported as [`crate::XlrelayError::Transport`], except
/// for locators the transport refuses outright, which are validation errors.
pub trait Transport {
    fn load(&self, locator: &FileLocator) -> Result<Vec<u8>>;
    fn save(&self, locator: &FileLocator, bytes: &[u8]) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn load(&self, locator: &FileLocator) -> Result<Vec<u8>> {
        (**self).load(locator)
    }

    fn save(&self, locator: &FileLocator, bytes: &[u8]) -> Result<()> {
        (**self).save(locator, bytes)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn load(&self, locator: &FileLocator) -> Result<Vec<u8>> {
        (**self).load(locator)
    }

    fn save(&self, locator: &FileLocator, bytes: &[u8]) -> Result<()> {
        (**self).save(locator, bytes)
    }
}

/// Workbook-level load and save over a byte transport.
#[derive(Debug)]
pub struct WorkbookSession<T> {
    transport: T,
}

impl<T: Transport> WorkbookSession<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Download and parse a workbook.
    pub fn load(&self, locator: &FileLocator) -> Result<Workbook> {
        let bytes = self.transport.load(locator)?;
        log::debug!("downloaded {} bytes from {locator}", bytes.len());
        parse(&bytes)
    }

    /// Serialize and upload a workbook in one call.
    pub fn save(&self, locator: &FileLocator, workbook: &Workbook) -> Result<()> {
        let bytes = save_xlsx(workbook)?;
        self.transport.save(locator, &bytes)?;
        log::debug!("uploaded {} bytes to {locator}", bytes.len());
        Ok(())
    }
}
