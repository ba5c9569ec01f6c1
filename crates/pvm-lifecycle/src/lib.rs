//! Protocol version lifecycle orchestration.
//!
//! [`ProtocolVersionManager`] coordinates the versions of one study over an
//! injected [`ProtocolVersionRepository`]: it loads and sorts them, derives
//! the current version, and runs the guarded create, submit, approve,
//! activate, update and delete operations.
//!
//! [`InMemoryRepository`] is a self-contained repository built on
//! [`VersionLedger`], which applies the store-side rules (identifier
//! assignment, unique version numbers, supersession on activation, final
//! terminal statuses).

pub mod error;
pub mod ledger;
pub mod manager;
pub mod memory;
pub mod repository;
pub mod selection;

pub use error::{LifecycleError, RepositoryError, Result};
pub use ledger::{StatusChange, VersionLedger};
pub use manager::{LifecycleSnapshot, ProtocolVersionManager};
pub use memory::InMemoryRepository;
pub use repository::ProtocolVersionRepository;
pub use selection::{derive_current_version, sort_versions};
