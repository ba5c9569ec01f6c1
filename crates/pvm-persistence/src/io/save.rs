//! Store saving operations.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use pvm_lifecycle::VersionLedger;

use crate::error::{PersistenceError, Result};
use crate::types::{StoreFile, StoreOptions};

/// Save a ledger to a store file.
///
/// Uses atomic write (temp file + rename) so a crash never leaves a
/// half-written store behind.
pub fn save_ledger(ledger: &VersionLedger, path: &Path, options: StoreOptions) -> Result<()> {
    let mut store = StoreFile::new(ledger.clone());
    store.touch();

    let bytes = serialize_store(&store, options)?;
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut file = File::create(&temp_path).map_err(|e| PersistenceError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(&bytes).map_err(|e| PersistenceError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;

    file.sync_all().map_err(|e| PersistenceError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| PersistenceError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(
        path = %path.display(),
        versions = ledger.len(),
        "Saved protocol version store"
    );
    Ok(())
}

fn serialize_store(store: &StoreFile, options: StoreOptions) -> Result<Vec<u8>> {
    let mut bytes = if options.pretty {
        serde_json::to_vec_pretty(store)
    } else {
        serde_json::to_vec(store)
    }
    .map_err(|e| PersistenceError::Serialization {
        source: Box::new(e),
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// `store.json` -> `store.json.tmp`, next to the target.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("store"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}
