//! The protocol version lifecycle manager.
//!
//! [`ProtocolVersionManager`] owns the version set of one study. Every
//! operation runs against the injected repository and, when it succeeds,
//! reloads the full set, re-derives the current version and publishes a new
//! [`LifecycleSnapshot`] to subscribers.

use pvm_model::{
    AmendmentType, NewProtocolVersion, ProtocolVersion, StatusInfo, StudyId, VersionAction,
    VersionCreateInput, VersionId, VersionNumber, VersionStatus, VersionUpdate, normalize_text,
};
use serde::{Serialize, Serializer};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{LifecycleError, Result};
use crate::repository::ProtocolVersionRepository;
use crate::selection::{derive_current_version, sort_versions};

const SUBMIT_NOTE: &str = "Submitted for internal review";
const APPROVE_NOTE: &str = "Protocol version approved";
const ACTIVATE_NOTE: &str = "Protocol version activated for use in trial";

/// Observable state of a manager.
///
/// Serialized versions carry their `statusInfo` capability record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleSnapshot {
    pub study_id: Option<StudyId>,
    /// Sorted newest first.
    #[serde(serialize_with = "serialize_versions")]
    pub protocol_versions: Vec<ProtocolVersion>,
    #[serde(serialize_with = "serialize_optional_version")]
    pub current_protocol_version: Option<ProtocolVersion>,
    #[serde(serialize_with = "serialize_optional_version")]
    pub editing_version: Option<ProtocolVersion>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionView<'a> {
    #[serde(flatten)]
    version: &'a ProtocolVersion,
    status_info: StatusInfo,
}

impl<'a> From<&'a ProtocolVersion> for VersionView<'a> {
    fn from(version: &'a ProtocolVersion) -> Self {
        Self {
            version,
            status_info: version.status_info(),
        }
    }
}

fn serialize_versions<S: Serializer>(
    versions: &[ProtocolVersion],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(versions.iter().map(VersionView::from))
}

fn serialize_optional_version<S: Serializer>(
    version: &Option<ProtocolVersion>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    version.as_ref().map(VersionView::from).serialize(serializer)
}

pub struct ProtocolVersionManager<R> {
    repository: R,
    requested_study: String,
    /// Whether `state.protocol_versions` reflects the repository yet.
    loaded: bool,
    state: LifecycleSnapshot,
    publisher: watch::Sender<LifecycleSnapshot>,
}

impl<R> std::fmt::Debug for ProtocolVersionManager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolVersionManager")
            .field("study", &self.requested_study)
            .field("loaded", &self.loaded)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<R: ProtocolVersionRepository> ProtocolVersionManager<R> {
    /// Manager for `study_id`. Nothing is loaded until
    /// [`load_protocol_versions`](Self::load_protocol_versions) is called;
    /// the first mutation loads the study itself if needed.
    pub fn new(repository: R, study_id: impl Into<String>) -> Self {
        let requested_study = study_id.into();
        let state = LifecycleSnapshot {
            study_id: StudyId::new(&requested_study).ok(),
            ..LifecycleSnapshot::default()
        };
        let (publisher, _) = watch::channel(state.clone());
        Self {
            repository,
            requested_study,
            loaded: false,
            state,
            publisher,
        }
    }

    /// Construct and load in one step.
    pub async fn open(repository: R, study_id: impl Into<String>) -> Result<Self> {
        let mut manager = Self::new(repository, study_id);
        manager.load_protocol_versions().await?;
        Ok(manager)
    }

    /// Switch to another study: state is cleared, then the new study is loaded.
    pub async fn set_study(&mut self, study_id: impl Into<String>) -> Result<()> {
        self.requested_study = study_id.into();
        self.loaded = false;
        self.state = LifecycleSnapshot {
            study_id: StudyId::new(&self.requested_study).ok(),
            ..LifecycleSnapshot::default()
        };
        self.publish();
        self.load_protocol_versions().await
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn study_id(&self) -> Option<&StudyId> {
        self.state.study_id.as_ref()
    }

    pub fn protocol_versions(&self) -> &[ProtocolVersion] {
        &self.state.protocol_versions
    }

    pub fn current_protocol_version(&self) -> Option<&ProtocolVersion> {
        self.state.current_protocol_version.as_ref()
    }

    pub fn editing_version(&self) -> Option<&ProtocolVersion> {
        self.state.editing_version.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.state.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn snapshot(&self) -> LifecycleSnapshot {
        self.state.clone()
    }

    /// Receiver that always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleSnapshot> {
        self.publisher.subscribe()
    }

    pub fn clear_error(&mut self) {
        if self.state.error.take().is_some() {
            self.publish();
        }
    }

    /// Select the version being edited. `None` ends editing.
    pub fn set_editing_version(&mut self, version_id: Option<VersionId>) -> Result<()> {
        self.state.editing_version = match version_id {
            Some(id) => Some(self.find_loaded(id)?.clone()),
            None => None,
        };
        self.publish();
        Ok(())
    }

    /// Fetch the study's versions and re-derive the current one.
    ///
    /// A manager without a valid study logs a warning and does nothing.
    pub async fn load_protocol_versions(&mut self) -> Result<()> {
        let Some(study_id) = self.state.study_id.clone() else {
            warn!(
                study_id = %self.requested_study,
                "Invalid study id provided, skipping protocol version load"
            );
            return Ok(());
        };

        self.begin();
        let result = self.reload(&study_id).await;
        self.finish(result)
    }

    /// Create a new draft version and return it.
    pub async fn create_protocol_version(
        &mut self,
        input: &VersionCreateInput,
    ) -> Result<ProtocolVersion> {
        self.begin();
        let result = self.try_create(input).await;
        self.finish(result)
    }

    pub async fn submit_for_review(&mut self, version_id: VersionId) -> Result<()> {
        self.begin();
        let result = self
            .try_transition(version_id, VersionAction::Submit, SUBMIT_NOTE)
            .await;
        self.finish(result)
    }

    pub async fn approve_protocol_version(&mut self, version_id: VersionId) -> Result<()> {
        self.begin();
        let result = self
            .try_transition(version_id, VersionAction::Approve, APPROVE_NOTE)
            .await;
        self.finish(result)
    }

    /// Activate an approved version. The repository supersedes the study's
    /// previously active version.
    pub async fn activate_protocol_version(&mut self, version_id: VersionId) -> Result<()> {
        self.begin();
        let result = self
            .try_transition(version_id, VersionAction::Activate, ACTIVATE_NOTE)
            .await;
        self.finish(result)
    }

    /// Update the content of a draft version.
    pub async fn update_protocol_version(
        &mut self,
        version_id: VersionId,
        update: &VersionUpdate,
    ) -> Result<()> {
        self.begin();
        let result = self.try_update(version_id, update).await;
        self.finish(result)
    }

    /// Delete a draft version.
    pub async fn delete_protocol_version(&mut self, version_id: VersionId) -> Result<()> {
        self.begin();
        let result = self.try_delete(version_id).await;
        self.finish(result)
    }

    /// Suggested number for the next version, assuming a minor amendment.
    pub fn generate_next_version_number(&self) -> String {
        self.generate_next_version_number_for(AmendmentType::Minor)
    }

    pub fn generate_next_version_number_for(&self, amendment: AmendmentType) -> String {
        pvm_model::generate_next_version_number(self.latest_version_number(), amendment)
    }

    pub fn compare_version_numbers(&self, a: &str, b: &str) -> std::cmp::Ordering {
        pvm_model::compare_version_numbers(a, b)
    }

    pub fn get_versions_by_status(&self, status: VersionStatus) -> Vec<&ProtocolVersion> {
        self.state
            .protocol_versions
            .iter()
            .filter(|version| version.status == status)
            .collect()
    }

    pub fn can_perform_action(
        &self,
        version: Option<&ProtocolVersion>,
        action: VersionAction,
    ) -> bool {
        pvm_model::can_perform_action(version, action)
    }

    pub fn get_active_version(&self) -> Option<&ProtocolVersion> {
        self.state
            .protocol_versions
            .iter()
            .find(|version| version.status == VersionStatus::Active)
    }

    /// Number of versions that have been approved, including the active one.
    pub fn get_approved_versions_count(&self) -> usize {
        self.state
            .protocol_versions
            .iter()
            .filter(|version| {
                matches!(
                    version.status,
                    VersionStatus::Approved | VersionStatus::Active
                )
            })
            .count()
    }

    fn latest_version_number(&self) -> Option<&str> {
        self.state
            .protocol_versions
            .first()
            .map(|version| version.version_number.as_str())
    }

    fn require_study(&self) -> Result<StudyId> {
        self.state
            .study_id
            .clone()
            .ok_or_else(|| LifecycleError::InvalidStudyId(self.requested_study.clone()))
    }

    fn find_loaded(&self, version_id: VersionId) -> Result<&ProtocolVersion> {
        self.state
            .protocol_versions
            .iter()
            .find(|version| version.id == version_id)
            .ok_or(LifecycleError::VersionNotFound(version_id))
    }

    fn guard(&self, version_id: VersionId, action: VersionAction) -> Result<()> {
        let version = self.find_loaded(version_id)?;
        if version.can(action) {
            return Ok(());
        }
        warn!(
            version_id = %version_id,
            status = %version.status,
            action = %action,
            "Protocol version action not allowed"
        );
        Err(LifecycleError::ActionNotAllowed {
            action,
            version_id,
            status: version.status,
        })
    }

    async fn try_create(&mut self, input: &VersionCreateInput) -> Result<ProtocolVersion> {
        let study_id = self.require_study()?;
        self.ensure_loaded(&study_id).await?;
        let new_version = self.resolve_new_version(input)?;
        let version_number = new_version.version_number.clone();

        let created = self.repository.create_version(&study_id, new_version).await?;
        info!(
            study_id = %study_id,
            version_id = %created.id,
            version_number = %version_number,
            amendment_type = %created.amendment_type,
            "Created protocol version"
        );

        self.reload(&study_id).await?;
        Ok(self
            .find_loaded(created.id)
            .map_or(created, ProtocolVersion::clone))
    }

    fn resolve_new_version(&self, input: &VersionCreateInput) -> Result<NewProtocolVersion> {
        let amendment_type = input.amendment_type.unwrap_or_else(|| {
            if self.state.protocol_versions.is_empty() {
                AmendmentType::Initial
            } else {
                AmendmentType::Minor
            }
        });

        let version_number = match normalize_text(input.version_number.as_deref()) {
            Some(number) => {
                let parsed = number.parse::<VersionNumber>()?;
                if let Some(latest) = self.latest_version_number()
                    && parsed < VersionNumber::parse(latest)
                {
                    return Err(LifecycleError::Validation(format!(
                        "Version number {number} must be greater than the latest version {latest}"
                    )));
                }
                number
            }
            None => self.generate_next_version_number_for(amendment_type),
        };

        let requires_regulatory_approval = input.requires_regulatory_approval.unwrap_or(true);
        if amendment_type.requires_regulatory_approval() && !requires_regulatory_approval {
            return Err(LifecycleError::Validation(format!(
                "{} amendments require regulatory approval",
                amendment_type.label()
            )));
        }

        let changes_summary = normalize_text(input.changes_summary.as_deref())
            .or_else(|| Some(amendment_type.default_changes_summary().to_string()));

        Ok(NewProtocolVersion {
            version_number,
            status: VersionStatus::Draft,
            amendment_type,
            description: normalize_text(input.description.as_deref()),
            amendment_reason: normalize_text(input.amendment_reason.as_deref()),
            changes_summary,
            effective_date: input.effective_date,
            requires_regulatory_approval,
            notify_stakeholders: input.notify_stakeholders.unwrap_or(true),
            created_by: normalize_text(input.created_by.as_deref()),
        })
    }

    async fn try_transition(
        &mut self,
        version_id: VersionId,
        action: VersionAction,
        note: &str,
    ) -> Result<()> {
        let study_id = self.require_study()?;
        self.ensure_loaded(&study_id).await?;
        self.guard(version_id, action)?;
        let Some(target) = action.target_status() else {
            return Err(LifecycleError::Validation(format!(
                "{action} does not change the status of a protocol version"
            )));
        };

        self.repository
            .update_version_status(version_id, target, Some(note))
            .await?;
        info!(
            study_id = %study_id,
            version_id = %version_id,
            status = %target,
            "Updated protocol version status"
        );

        self.reload(&study_id).await
    }

    async fn try_update(&mut self, version_id: VersionId, update: &VersionUpdate) -> Result<()> {
        let study_id = self.require_study()?;
        if update.is_empty() {
            return Err(LifecycleError::Validation(
                "At least one field must be provided for update".to_string(),
            ));
        }
        self.ensure_loaded(&study_id).await?;
        self.guard(version_id, VersionAction::Edit)?;

        self.repository.update_version(version_id, update).await?;
        info!(study_id = %study_id, version_id = %version_id, "Updated protocol version");

        self.reload(&study_id).await
    }

    async fn try_delete(&mut self, version_id: VersionId) -> Result<()> {
        let study_id = self.require_study()?;
        self.ensure_loaded(&study_id).await?;
        let version = self.find_loaded(version_id)?;
        if version.status != VersionStatus::Draft {
            warn!(
                version_id = %version_id,
                status = %version.status,
                "Refusing to delete a non-draft protocol version"
            );
            return Err(LifecycleError::DeleteRequiresDraft {
                version_id,
                status: version.status,
            });
        }

        self.repository.delete_version(version_id).await?;
        info!(study_id = %study_id, version_id = %version_id, "Deleted protocol version");

        self.reload(&study_id).await
    }

    async fn ensure_loaded(&mut self, study_id: &StudyId) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.reload(study_id).await
    }

    /// Replace the loaded set with the repository's view of the study.
    async fn reload(&mut self, study_id: &StudyId) -> Result<()> {
        let mut versions = self.repository.get_version_history(study_id).await?;
        sort_versions(&mut versions);
        let current = derive_current_version(&versions).cloned();

        let editing = self.state.editing_version.as_ref().and_then(|editing| {
            versions
                .iter()
                .find(|version| version.id == editing.id)
                .cloned()
        });

        debug!(
            study_id = %study_id,
            versions = versions.len(),
            current = ?current.as_ref().map(|version| &version.version_number),
            "Reloaded protocol versions"
        );

        self.state.protocol_versions = versions;
        self.state.current_protocol_version = current;
        self.state.editing_version = editing;
        self.loaded = true;
        Ok(())
    }

    fn begin(&mut self) {
        self.state.loading = true;
        self.state.error = None;
        self.publish();
    }

    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        self.state.loading = false;
        if let Err(err) = &result {
            error!(
                study_id = %self.requested_study,
                error = %err,
                "Protocol version operation failed"
            );
            self.state.error = Some(err.user_message());
        }
        self.publish();
        result
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}
