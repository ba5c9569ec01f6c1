//! Store loading operations.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use pvm_lifecycle::VersionLedger;

use crate::error::{PersistenceError, Result};
use crate::types::{CURRENT_SCHEMA_VERSION, STORE_FORMAT, StoreFile};

/// Load the ledger held in a store file.
///
/// A missing file is an empty store.
pub fn load_ledger(path: &Path) -> Result<VersionLedger> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Store file not found, starting empty");
            return Ok(VersionLedger::new());
        }
        Err(e) => {
            return Err(PersistenceError::Io {
                operation: "read",
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let store = parse_store(&text, path)?;
    tracing::debug!(
        path = %path.display(),
        versions = store.ledger.len(),
        "Loaded protocol version store"
    );
    Ok(store.ledger)
}

/// Parse store text and validate the format.
fn parse_store(text: &str, path: &Path) -> Result<StoreFile> {
    let store: StoreFile =
        serde_json::from_str(text).map_err(|e| PersistenceError::Deserialization {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    if store.format != STORE_FORMAT {
        return Err(PersistenceError::InvalidFormat {
            path: path.to_path_buf(),
            reason: format!("unexpected format tag {:?}", store.format),
        });
    }

    if store.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: store.schema_version,
            max_supported: CURRENT_SCHEMA_VERSION,
            path: path.to_path_buf(),
        });
    }

    Ok(store)
}
