//! Local directory transport.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, XlrelayError};

use super::{FileLocator, Transport};

/// Stores files under a root directory; locators are relative paths.
#[derive(Debug, Clone)]
pub struct FsTransport {
    root: PathBuf,
}

impl FsTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a locator to a path, refusing anything that leaves the root.
    fn resolve(&self, locator: &FileLocator) -> Result<PathBuf> {
        let relative = Path::new(locator.as_str());
        let escapes = relative.as_os_str().is_empty()
            || relative.components().any(|c| {
                matches!(
                    c,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            });
        if escapes {
            return Err(XlrelayError::validation(format!(
                "File locator \"{locator}\" must be a relative path inside the root"
            )));
        }
        Ok(self.root.join(relative))
    }
}

fn transport_err(action: &str, path: &Path, e: &std::io::Error) -> XlrelayError {
    XlrelayError::Transport(format!("{action} {}: {e}", path.display()))
}

impl Transport for FsTransport {
    fn load(&self, locator: &FileLocator) -> Result<Vec<u8>> {
        let path = self.resolve(locator)?;
        fs::read(&path).map_err(|e| transport_err("cannot read", &path, &e))
    }

    fn save(&self, locator: &FileLocator, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(locator)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| transport_err("cannot create", parent, &e))?;
        }

        // Write a sibling first so readers never observe a half-written file
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".xlrelay-tmp");
        let tmp = path.with_file_name(tmp_name);
        fs::write(&tmp, bytes).map_err(|e| transport_err("cannot write", &tmp, &e))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(transport_err("cannot replace", &path, &e));
        }
        log::debug!("saved {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}
