//! In-memory repository.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use pvm_model::{
    NewProtocolVersion, ProtocolVersion, StudyId, VersionId, VersionStatus, VersionUpdate,
};

use crate::error::RepositoryError;
use crate::ledger::{StatusChange, VersionLedger};
use crate::repository::ProtocolVersionRepository;

/// Repository holding a [`VersionLedger`] in memory.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    ledger: Mutex<VersionLedger>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository seeded with existing records.
    #[must_use]
    pub fn with_versions(versions: impl IntoIterator<Item = ProtocolVersion>) -> Self {
        let mut ledger = VersionLedger::new();
        for version in versions {
            ledger.insert(version);
        }
        Self::from_ledger(ledger)
    }

    #[must_use]
    pub fn from_ledger(ledger: VersionLedger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
        }
    }

    /// Status change trail of one version.
    pub fn status_changes(
        &self,
        version_id: VersionId,
    ) -> Result<Vec<StatusChange>, RepositoryError> {
        Ok(self.lock()?.status_changes(version_id))
    }

    /// Copy of the whole ledger.
    pub fn ledger_snapshot(&self) -> Result<VersionLedger, RepositoryError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, VersionLedger>, RepositoryError> {
        self.ledger.lock().map_err(|_| RepositoryError::Storage {
            message: "in-memory ledger lock poisoned".to_string(),
            source: None,
        })
    }
}

#[async_trait]
impl ProtocolVersionRepository for InMemoryRepository {
    async fn get_version_history(
        &self,
        study_id: &StudyId,
    ) -> Result<Vec<ProtocolVersion>, RepositoryError> {
        Ok(self.lock()?.history(study_id))
    }

    async fn create_version(
        &self,
        study_id: &StudyId,
        version: NewProtocolVersion,
    ) -> Result<ProtocolVersion, RepositoryError> {
        self.lock()?.create(study_id, version, Utc::now())
    }

    async fn update_version_status(
        &self,
        version_id: VersionId,
        status: VersionStatus,
        note: Option<&str>,
    ) -> Result<(), RepositoryError> {
        self.lock()?.update_status(version_id, status, note, Utc::now())
    }

    async fn update_version(
        &self,
        version_id: VersionId,
        update: &VersionUpdate,
    ) -> Result<(), RepositoryError> {
        self.lock()?.update(version_id, update)
    }

    async fn delete_version(&self, version_id: VersionId) -> Result<(), RepositoryError> {
        self.lock()?.delete(version_id).map(|_| ())
    }
}
