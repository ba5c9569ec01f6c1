//! On-disk layout of a protocol version store.

use chrono::{DateTime, Utc};
use pvm_lifecycle::VersionLedger;
use serde::{Deserialize, Serialize};

/// Identifies a file as a protocol version store.
pub const STORE_FORMAT: &str = "pvm-protocol-versions";

/// Current store schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Top-level JSON document of a store file.
///
/// ```text
/// {
///   "format": "pvm-protocol-versions",
///   "schemaVersion": 1,
///   "savedAt": "2025-03-01T09:30:00Z",
///   "ledger": { "lastId": 2, "versions": [...], "statusChanges": [...] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreFile {
    pub format: String,
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ledger: VersionLedger,
}

impl StoreFile {
    #[must_use]
    pub fn new(ledger: VersionLedger) -> Self {
        Self {
            format: STORE_FORMAT.to_string(),
            schema_version: CURRENT_SCHEMA_VERSION,
            saved_at: None,
            ledger,
        }
    }

    /// Update the saved timestamp.
    pub fn touch(&mut self) {
        self.saved_at = Some(Utc::now());
    }
}

/// How a store is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Pretty-print the JSON (default: on).
    pub pretty: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl StoreOptions {
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}
