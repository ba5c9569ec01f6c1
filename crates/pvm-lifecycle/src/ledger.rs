//! Store-side rules shared by the bundled repositories.
//!
//! A [`VersionLedger`] is the complete state of a protocol version store:
//! versions of every study, the identifier sequence, and the audit trail of
//! status changes. It enforces the rules a study-design service applies on
//! its side of the contract:
//!
//! - identifiers are assigned sequentially and never reused;
//! - version numbers are unique within a study (numerically, so "1.2" and
//!   "1.2.0" collide);
//! - superseded and withdrawn versions never change status again;
//! - activating a version supersedes the study's previously active version;
//! - only draft versions accept content updates.

use chrono::{DateTime, Utc};
use pvm_model::{
    NewProtocolVersion, ProtocolVersion, StudyId, VersionAction, VersionId, VersionStatus,
    VersionUpdate,
};
use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;

/// Audit record of one status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub version_id: VersionId,
    pub from: VersionStatus,
    pub to: VersionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionLedger {
    #[serde(default)]
    last_id: u64,
    #[serde(default)]
    versions: Vec<ProtocolVersion>,
    #[serde(default)]
    status_changes: Vec<StatusChange>,
}

impl VersionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an existing record as-is, keeping the identifier sequence ahead
    /// of it. Used to seed a store.
    pub fn insert(&mut self, version: ProtocolVersion) {
        self.last_id = self.last_id.max(version.id.0);
        self.versions.retain(|existing| existing.id != version.id);
        self.versions.push(version);
    }

    /// Versions of one study, in insertion order.
    #[must_use]
    pub fn history(&self, study_id: &StudyId) -> Vec<ProtocolVersion> {
        self.versions
            .iter()
            .filter(|version| &version.study_id == study_id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn get(&self, version_id: VersionId) -> Option<&ProtocolVersion> {
        self.versions.iter().find(|version| version.id == version_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Status change trail of one version, oldest first.
    #[must_use]
    pub fn status_changes(&self, version_id: VersionId) -> Vec<StatusChange> {
        self.status_changes
            .iter()
            .filter(|change| change.version_id == version_id)
            .cloned()
            .collect()
    }

    pub fn create(
        &mut self,
        study_id: &StudyId,
        version: NewProtocolVersion,
        now: DateTime<Utc>,
    ) -> Result<ProtocolVersion, RepositoryError> {
        let number = pvm_model::VersionNumber::parse(&version.version_number);
        let duplicate = self
            .versions
            .iter()
            .any(|existing| &existing.study_id == study_id && existing.number() == number);
        if duplicate {
            return Err(RepositoryError::DuplicateVersionNumber {
                study_id: study_id.clone(),
                version_number: version.version_number,
            });
        }

        self.last_id += 1;
        let created = version.into_version(VersionId(self.last_id), study_id.clone(), now);
        self.versions.push(created.clone());
        Ok(created)
    }

    pub fn update_status(
        &mut self,
        version_id: VersionId,
        status: VersionStatus,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let (study_id, from, version_number) = {
            let version = self
                .get(version_id)
                .ok_or(RepositoryError::NotFound(version_id))?;
            (
                version.study_id.clone(),
                version.status,
                version.version_number.clone(),
            )
        };
        if from.is_terminal() {
            return Err(RepositoryError::TerminalStatus {
                version_id,
                status: from,
            });
        }

        if status == VersionStatus::Active {
            let note = format!("Superseded by version {version_number}");
            let previously_active: Vec<VersionId> = self
                .versions
                .iter()
                .filter(|other| {
                    other.study_id == study_id
                        && other.id != version_id
                        && other.status == VersionStatus::Active
                })
                .map(|other| other.id)
                .collect();
            for other_id in previously_active {
                self.set_status(other_id, VersionStatus::Superseded, Some(&note), now);
            }
        }

        self.set_status(version_id, status, note, now);
        Ok(())
    }

    pub fn update(
        &mut self,
        version_id: VersionId,
        update: &VersionUpdate,
    ) -> Result<(), RepositoryError> {
        let version = self
            .versions
            .iter_mut()
            .find(|version| version.id == version_id)
            .ok_or(RepositoryError::NotFound(version_id))?;
        if !version.can(VersionAction::Edit) {
            return Err(RepositoryError::Rejected(format!(
                "protocol version {version_id} is {} and can no longer be edited",
                version.status
            )));
        }
        update.apply_to(version);
        Ok(())
    }

    pub fn delete(&mut self, version_id: VersionId) -> Result<ProtocolVersion, RepositoryError> {
        let index = self
            .versions
            .iter()
            .position(|version| version.id == version_id)
            .ok_or(RepositoryError::NotFound(version_id))?;
        self.status_changes
            .retain(|change| change.version_id != version_id);
        Ok(self.versions.remove(index))
    }

    fn set_status(
        &mut self,
        version_id: VersionId,
        status: VersionStatus,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) {
        let Some(version) = self
            .versions
            .iter_mut()
            .find(|version| version.id == version_id)
        else {
            return;
        };
        let from = version.status;
        version.status = status;
        self.status_changes.push(StatusChange {
            version_id,
            from,
            to: status,
            note: note.map(str::to_string),
            changed_at: now,
        });
    }
}
