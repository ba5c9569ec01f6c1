//! Repository contract consumed by the lifecycle manager.
//!
//! Implementations talk to whatever holds the versions: the study-design
//! service, a local file, or memory. The repository, not the manager, is the
//! place where store-wide effects happen (identifier assignment, supersession
//! of the previously active version).

use std::sync::Arc;

use async_trait::async_trait;
use pvm_model::{
    NewProtocolVersion, ProtocolVersion, StudyId, VersionId, VersionStatus, VersionUpdate,
};

use crate::error::RepositoryError;

#[async_trait]
pub trait ProtocolVersionRepository: Send + Sync {
    /// All versions of a study, in no particular order.
    async fn get_version_history(
        &self,
        study_id: &StudyId,
    ) -> Result<Vec<ProtocolVersion>, RepositoryError>;

    /// Store a new version and return it with its assigned identity.
    async fn create_version(
        &self,
        study_id: &StudyId,
        version: NewProtocolVersion,
    ) -> Result<ProtocolVersion, RepositoryError>;

    /// Move a version to `status`. Activation supersedes the study's
    /// previously active version.
    async fn update_version_status(
        &self,
        version_id: VersionId,
        status: VersionStatus,
        note: Option<&str>,
    ) -> Result<(), RepositoryError>;

    /// Apply a content update without touching the status.
    async fn update_version(
        &self,
        version_id: VersionId,
        update: &VersionUpdate,
    ) -> Result<(), RepositoryError>;

    async fn delete_version(&self, version_id: VersionId) -> Result<(), RepositoryError>;
}

#[async_trait]
impl<T> ProtocolVersionRepository for Arc<T>
where
    T: ProtocolVersionRepository + ?Sized,
{
    async fn get_version_history(
        &self,
        study_id: &StudyId,
    ) -> Result<Vec<ProtocolVersion>, RepositoryError> {
        (**self).get_version_history(study_id).await
    }

    async fn create_version(
        &self,
        study_id: &StudyId,
        version: NewProtocolVersion,
    ) -> Result<ProtocolVersion, RepositoryError> {
        (**self).create_version(study_id, version).await
    }

    async fn update_version_status(
        &self,
        version_id: VersionId,
        status: VersionStatus,
        note: Option<&str>,
    ) -> Result<(), RepositoryError> {
        (**self)
            .update_version_status(version_id, status, note)
            .await
    }

    async fn update_version(
        &self,
        version_id: VersionId,
        update: &VersionUpdate,
    ) -> Result<(), RepositoryError> {
        (**self).update_version(version_id, update).await
    }

    async fn delete_version(&self, version_id: VersionId) -> Result<(), RepositoryError> {
        (**self).delete_version(version_id).await
    }
}
