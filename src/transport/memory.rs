//! In-process transport for tests and dry runs.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Result, XlrelayError};

use super::{FileLocator, Transport};

#[derive(Debug, Default)]
struct Store {
    files: HashMap<FileLocator, Vec<u8>>,
    locked: HashSet<FileLocator>,
}

/// A map of locator to bytes. Locators can be locked to simulate another
/// session holding the file open.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    store: Mutex<Store>,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, locator: impl Into<FileLocator>, bytes: Vec<u8>) {
        self.store().files.insert(locator.into(), bytes);
    }

    pub fn get(&self, locator: &FileLocator) -> Option<Vec<u8>> {
        self.store().files.get(locator).cloned()
    }

    /// Make every save to `locator` fail with a lock conflict.
    pub fn lock(&self, locator: impl Into<FileLocator>) {
        self.store().locked.insert(locator.into());
    }

    pub fn unlock(&self, locator: &FileLocator) {
        self.store().locked.remove(locator);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl Transport for MemoryTransport {
    fn load(&self, locator: &FileLocator) -> Result<Vec<u8>> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.get(locator)
            .ok_or_else(|| XlrelayError::Transport(format!("file not found: {locator}")))
    }

    fn save(&self, locator: &FileLocator, bytes: &[u8]) -> Result<()> {
        self.saves.fetch_add(1, Ordering::Relaxed);
        let mut store = self.store();
        if store.locked.contains(locator) {
            return Err(XlrelayError::Transport(format!(
                "resource locked: {locator} is open in another session"
            )));
        }
        store.files.insert(locator.clone(), bytes.to_vec());
        Ok(())
    }
}
