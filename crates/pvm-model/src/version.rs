//! The protocol version entity and its create/update inputs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::amendment::AmendmentType;
use crate::error::ModelError;
use crate::numbering::VersionNumber;
use crate::status::{StatusInfo, VersionAction, VersionStatus};

/// Identifier assigned to a version by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub u64);

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VersionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Identifier of the study that owns a set of protocol versions.
///
/// Always non-blank and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StudyId(String);

impl StudyId {
    pub fn new(value: impl AsRef<str>) -> Result<Self, ModelError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ModelError::BlankStudyId);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StudyId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for StudyId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StudyId> for String {
    fn from(value: StudyId) -> Self {
        value.0
    }
}

/// A dated revision of a study's clinical-trial protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolVersion {
    pub id: VersionId,
    pub study_id: StudyId,
    pub version_number: String,
    pub status: VersionStatus,
    pub amendment_type: AmendmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amendment_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default = "default_true")]
    pub requires_regulatory_approval: bool,
    #[serde(default = "default_true")]
    pub notify_stakeholders: bool,
}

fn default_true() -> bool {
    true
}

impl ProtocolVersion {
    /// Capability record for the current status.
    #[must_use]
    pub const fn status_info(&self) -> StatusInfo {
        self.status.info()
    }

    /// Lenient numeric form of `version_number`.
    #[must_use]
    pub fn number(&self) -> VersionNumber {
        VersionNumber::parse(&self.version_number)
    }

    #[must_use]
    pub const fn can(&self, action: VersionAction) -> bool {
        self.status.allows(action)
    }
}

/// Whether `version` may perform `action`. A missing version may do nothing.
#[must_use]
pub fn can_perform_action(version: Option<&ProtocolVersion>, action: VersionAction) -> bool {
    version.is_some_and(|version| version.can(action))
}

/// Caller-supplied fields for a new version. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VersionCreateInput {
    pub version_number: Option<String>,
    pub amendment_type: Option<AmendmentType>,
    pub description: Option<String>,
    pub amendment_reason: Option<String>,
    pub changes_summary: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub requires_regulatory_approval: Option<bool>,
    pub notify_stakeholders: Option<bool>,
    pub created_by: Option<String>,
}

/// Fully-resolved record handed to the repository on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProtocolVersion {
    pub version_number: String,
    pub status: VersionStatus,
    pub amendment_type: AmendmentType,
    pub description: Option<String>,
    pub amendment_reason: Option<String>,
    pub changes_summary: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub requires_regulatory_approval: bool,
    pub notify_stakeholders: bool,
    pub created_by: Option<String>,
}

impl NewProtocolVersion {
    /// Materialize the stored record once the repository has assigned
    /// identity and creation time.
    #[must_use]
    pub fn into_version(
        self,
        id: VersionId,
        study_id: StudyId,
        created_date: DateTime<Utc>,
    ) -> ProtocolVersion {
        ProtocolVersion {
            id,
            study_id,
            version_number: self.version_number,
            status: self.status,
            amendment_type: self.amendment_type,
            description: self.description,
            amendment_reason: self.amendment_reason,
            changes_summary: self.changes_summary,
            effective_date: self.effective_date,
            created_date: Some(created_date),
            created_by: self.created_by,
            requires_regulatory_approval: self.requires_regulatory_approval,
            notify_stakeholders: self.notify_stakeholders,
        }
    }
}

/// Partial content update. `None` leaves a field unchanged; a blank string
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VersionUpdate {
    pub description: Option<String>,
    pub amendment_reason: Option<String>,
    pub changes_summary: Option<String>,
    pub effective_date: Option<NaiveDate>,
}

impl VersionUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.amendment_reason.is_none()
            && self.changes_summary.is_none()
            && self.effective_date.is_none()
    }

    /// Apply the update to a stored version, normalizing blank text to `None`.
    pub fn apply_to(&self, version: &mut ProtocolVersion) {
        if let Some(description) = &self.description {
            version.description = normalize_text(Some(description));
        }
        if let Some(reason) = &self.amendment_reason {
            version.amendment_reason = normalize_text(Some(reason));
        }
        if let Some(summary) = &self.changes_summary {
            version.changes_summary = normalize_text(Some(summary));
        }
        if let Some(date) = self.effective_date {
            version.effective_date = Some(date);
        }
    }
}

/// Trim free text and collapse blank values to `None`.
#[must_use]
pub fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_study_id_rejects_blank() {
        assert_eq!(StudyId::new("   "), Err(ModelError::BlankStudyId));
        assert_eq!(StudyId::new(" 42 ").unwrap().as_str(), "42");
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(None), None);
        assert_eq!(normalize_text(Some("")), None);
        assert_eq!(normalize_text(Some("  \t")), None);
        assert_eq!(normalize_text(Some(" why ")), Some("why".to_string()));
    }

    #[test]
    fn test_update_blank_clears_field() {
        let mut version = NewProtocolVersion {
            version_number: "1.0".to_string(),
            status: VersionStatus::Draft,
            amendment_type: AmendmentType::Initial,
            description: Some("first".to_string()),
            amendment_reason: None,
            changes_summary: None,
            effective_date: None,
            requires_regulatory_approval: true,
            notify_stakeholders: true,
            created_by: None,
        }
        .into_version(VersionId(1), StudyId::new("S1").unwrap(), Utc::now());

        let update = VersionUpdate {
            description: Some("  ".to_string()),
            changes_summary: Some("Reworded eligibility".to_string()),
            ..Default::default()
        };
        update.apply_to(&mut version);

        assert_eq!(version.description, None);
        assert_eq!(
            version.changes_summary.as_deref(),
            Some("Reworded eligibility")
        );
    }

    #[test]
    fn test_can_perform_action_without_version() {
        for action in VersionAction::ALL {
            assert!(!can_perform_action(None, action));
        }
    }
}
