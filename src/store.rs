//! Invoice snapshot persistence.
//!
//! One invoice lives under one fixed key. The snapshot is the whole
//! `InvoiceState` as JSON, written on save and read back on load; a
//! missing or unreadable snapshot simply means "start fresh".

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::MillError;
use crate::model::InvoiceState;

/// Storage key for the one invoice being worked on.
pub const SNAPSHOT_KEY: &str = "currentInvoice";

/// Directory-backed snapshot store.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SnapshotStore { dir: dir.into() }
    }

    /// Path of the snapshot file, `<dir>/currentInvoice.json`.
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{SNAPSHOT_KEY}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the saved invoice, or `None` when there is nothing usable.
    ///
    /// A snapshot that cannot be parsed is treated the same as a missing
    /// one, logged and skipped, so a corrupt file never blocks startup.
    pub fn load(&self) -> Option<InvoiceState> {
        let path = self.path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => return None,
        };
        match serde_json::from_str::<InvoiceState>(&text) {
            Ok(mut state) => {
                state.ensure_items();
                Some(state)
            }
            Err(e) => {
                log::warn!("Ignoring unreadable snapshot at {}: {e}", path.display());
                None
            }
        }
    }

    /// Write the whole invoice, replacing any previous snapshot.
    pub fn save(&self, state: &InvoiceState) -> Result<(), MillError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| MillError::Store(e.to_string()))?;
        fs::write(self.path(), json)?;
        Ok(())
    }

    /// Delete the snapshot. Removing a snapshot that is not there is fine.
    pub fn remove(&self) -> Result<(), MillError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MillError::Io(e)),
        }
    }
}
