//! JSON file storage for protocol versions.
//!
//! The store is a single JSON document holding a [`VersionLedger`]
//! (versions of every study, the identifier sequence and the status change
//! trail) inside a small versioned envelope.
//!
//! # Features
//!
//! - **Atomic writes** (temp file, fsync, rename) to prevent corruption
//! - **Format validation** with a format tag and schema version
//! - **[`FileRepository`]**, a [`ProtocolVersionRepository`] over the file
//!
//! [`VersionLedger`]: pvm_lifecycle::VersionLedger
//! [`ProtocolVersionRepository`]: pvm_lifecycle::ProtocolVersionRepository

mod error;
mod io;
mod repository;
mod types;

pub use error::{PersistenceError, Result};
pub use io::{load_ledger, save_ledger};
pub use repository::FileRepository;
pub use types::{CURRENT_SCHEMA_VERSION, STORE_FORMAT, StoreFile, StoreOptions};
