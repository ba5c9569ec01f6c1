//! Repository backed by a JSON store file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use pvm_lifecycle::{ProtocolVersionRepository, RepositoryError, StatusChange, VersionLedger};
use pvm_model::{
    NewProtocolVersion, ProtocolVersion, StudyId, VersionId, VersionStatus, VersionUpdate,
};
use tokio::sync::Mutex;

use crate::io::{load_ledger, save_ledger};
use crate::types::StoreOptions;

/// Protocol version repository persisted to a single JSON file.
///
/// Every call loads the file, applies the ledger rules and, for mutations,
/// writes it back atomically. Calls through one repository are serialized;
/// separate processes sharing a file are not coordinated (last writer wins).
#[derive(Debug)]
pub struct FileRepository {
    path: PathBuf,
    options: StoreOptions,
    lock: Mutex<()>,
}

impl FileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, StoreOptions::default())
    }

    pub fn with_options(path: impl Into<PathBuf>, options: StoreOptions) -> Self {
        Self {
            path: path.into(),
            options,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Status change trail of one version.
    pub async fn status_changes(
        &self,
        version_id: VersionId,
    ) -> Result<Vec<StatusChange>, RepositoryError> {
        self.read(move |ledger| Ok(ledger.status_changes(version_id))).await
    }

    /// Apply `f` to a freshly loaded ledger without saving.
    async fn read<T, F>(&self, f: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&VersionLedger) -> Result<T, RepositoryError> + Send + 'static,
    {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let ledger = load_ledger(&path)?;
            f(&ledger)
        })
        .await
        .map_err(|e| RepositoryError::storage("store task failed", e))?
    }

    /// Load, apply `f`, and save when it succeeds.
    async fn write<T, F>(&self, f: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&mut VersionLedger) -> Result<T, RepositoryError> + Send + 'static,
    {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let options = self.options;
        tokio::task::spawn_blocking(move || {
            let mut ledger = load_ledger(&path)?;
            let value = f(&mut ledger)?;
            save_ledger(&ledger, &path, options)?;
            Ok(value)
        })
        .await
        .map_err(|e| RepositoryError::storage("store task failed", e))?
    }
}

#[async_trait]
impl ProtocolVersionRepository for FileRepository {
    async fn get_version_history(
        &self,
        study_id: &StudyId,
    ) -> Result<Vec<ProtocolVersion>, RepositoryError> {
        let study_id = study_id.clone();
        self.read(move |ledger| Ok(ledger.history(&study_id))).await
    }

    async fn create_version(
        &self,
        study_id: &StudyId,
        version: NewProtocolVersion,
    ) -> Result<ProtocolVersion, RepositoryError> {
        let study_id = study_id.clone();
        let created = self
            .write(move |ledger| ledger.create(&study_id, version, Utc::now()))
            .await?;
        tracing::info!(
            path = %self.path.display(),
            version_id = %created.id,
            "Stored new protocol version"
        );
        Ok(created)
    }

    async fn update_version_status(
        &self,
        version_id: VersionId,
        status: VersionStatus,
        note: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let note = note.map(str::to_string);
        self.write(move |ledger| {
            ledger.update_status(version_id, status, note.as_deref(), Utc::now())
        })
        .await
    }

    async fn update_version(
        &self,
        version_id: VersionId,
        update: &VersionUpdate,
    ) -> Result<(), RepositoryError> {
        let update = update.clone();
        self.write(move |ledger| ledger.update(version_id, &update)).await
    }

    async fn delete_version(&self, version_id: VersionId) -> Result<(), RepositoryError> {
        let removed = self.write(move |ledger| ledger.delete(version_id)).await?;
        tracing::info!(
            path = %self.path.display(),
            version_id = %removed.id,
            version_number = %removed.version_number,
            "Removed protocol version from store"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvm_model::AmendmentType;
    use tempfile::tempdir;

    fn draft(number: &str) -> NewProtocolVersion {
        NewProtocolVersion {
            version_number: number.to_string(),
            status: VersionStatus::Draft,
            amendment_type: AmendmentType::Minor,
            description: None,
            amendment_reason: None,
            changes_summary: None,
            effective_date: None,
            requires_regulatory_approval: true,
            notify_stakeholders: true,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_changes_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let study = StudyId::new("S1").unwrap();

        let repo = FileRepository::new(&path);
        let created = repo.create_version(&study, draft("1.0")).await.unwrap();
        repo.update_version_status(created.id, VersionStatus::Withdrawn, Some("cancelled"))
            .await
            .unwrap();

        let reopened = FileRepository::new(&path);
        let history = reopened.get_version_history(&study).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, VersionStatus::Withdrawn);

        let trail = reopened.status_changes(created.id).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].note.as_deref(), Some("cancelled"));
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let study = StudyId::new("S1").unwrap();

        let repo = FileRepository::new(&path);
        repo.create_version(&study, draft("1.0")).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let result = repo.create_version(&study, draft("1.0")).await;
        assert!(matches!(
            result,
            Err(RepositoryError::DuplicateVersionNumber { .. })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_reading_does_not_create_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let repo = FileRepository::new(&path);
        let history = repo
            .get_version_history(&StudyId::new("S1").unwrap())
            .await
            .unwrap();

        assert!(history.is_empty());
        assert!(!path.exists());
    }
}
