//! Lifecycle status policy for protocol versions.
//!
//! Every status carries a fixed capability record. An action is legal when
//! the matching capability flag is set on the version's current status, and
//! each action always lands on the same target status:
//!
//! | action   | guard          | target         |
//! |----------|----------------|----------------|
//! | edit     | `can_edit`     | (no change)    |
//! | submit   | `can_submit`   | `UNDER_REVIEW` |
//! | approve  | `can_approve`  | `APPROVED`     |
//! | activate | `can_activate` | `ACTIVE`       |
//!
//! `SUPERSEDED` and `WITHDRAWN` are terminal; they are reached through
//! supersession or administrative withdrawal, never through an action.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Lifecycle status of a protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionStatus {
    /// In development; the only editable status.
    #[default]
    Draft,
    /// Submitted to IRB/EC for review.
    UnderReview,
    /// Under IRB/EC review for approval.
    AmendmentReview,
    /// Approved by IRB/EC and regulatory bodies.
    Approved,
    /// Currently governing trial conduct. Older services call this `PUBLISHED`.
    #[serde(alias = "PUBLISHED")]
    Active,
    /// Replaced by a newer active version.
    Superseded,
    /// Withdrawn by an administrator.
    Withdrawn,
}

/// Capability record and display metadata for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub value: VersionStatus,
    pub label: &'static str,
    pub description: &'static str,
    pub can_edit: bool,
    pub can_submit: bool,
    pub can_approve: bool,
    pub can_activate: bool,
}

impl StatusInfo {
    /// Whether this status permits `action`.
    #[must_use]
    pub const fn allows(&self, action: VersionAction) -> bool {
        match action {
            VersionAction::Edit => self.can_edit,
            VersionAction::Submit => self.can_submit,
            VersionAction::Approve => self.can_approve,
            VersionAction::Activate => self.can_activate,
        }
    }
}

const fn info(
    value: VersionStatus,
    label: &'static str,
    description: &'static str,
    [can_edit, can_submit, can_approve, can_activate]: [bool; 4],
) -> StatusInfo {
    StatusInfo {
        value,
        label,
        description,
        can_edit,
        can_submit,
        can_approve,
        can_activate,
    }
}

impl VersionStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [VersionStatus; 7] = [
        VersionStatus::Draft,
        VersionStatus::UnderReview,
        VersionStatus::AmendmentReview,
        VersionStatus::Approved,
        VersionStatus::Active,
        VersionStatus::Superseded,
        VersionStatus::Withdrawn,
    ];

    /// Canonical wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::UnderReview => "UNDER_REVIEW",
            Self::AmendmentReview => "AMENDMENT_REVIEW",
            Self::Approved => "APPROVED",
            Self::Active => "ACTIVE",
            Self::Superseded => "SUPERSEDED",
            Self::Withdrawn => "WITHDRAWN",
        }
    }

    /// Capability record for this status.
    #[must_use]
    pub const fn info(&self) -> StatusInfo {
        match self {
            Self::Draft => info(
                *self,
                "Initial Draft",
                "Protocol version in development",
                [true, true, false, false],
            ),
            Self::UnderReview => info(
                *self,
                "Submitted for Review",
                "Submitted to IRB/EC for review",
                [false; 4],
            ),
            Self::AmendmentReview => info(
                *self,
                "Pending Approval",
                "Under IRB/EC review for approval",
                [false, false, true, false],
            ),
            Self::Approved => info(
                *self,
                "Approved",
                "Approved by IRB/EC and regulatory bodies",
                [false, false, false, true],
            ),
            Self::Active => info(
                *self,
                "Active",
                "Currently active protocol version",
                [false; 4],
            ),
            Self::Superseded => info(
                *self,
                "Superseded",
                "Replaced by newer version",
                [false; 4],
            ),
            Self::Withdrawn => info(
                *self,
                "Withdrawn",
                "Protocol version withdrawn",
                [false; 4],
            ),
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.info().label
    }

    /// Whether the status permits `action`.
    #[must_use]
    pub const fn allows(&self, action: VersionAction) -> bool {
        self.info().allows(action)
    }

    /// Actions permitted from this status.
    #[must_use]
    pub fn allowed_actions(&self) -> Vec<VersionAction> {
        VersionAction::ALL
            .into_iter()
            .filter(|action| self.allows(*action))
            .collect()
    }

    /// Superseded and withdrawn versions never change status again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Superseded | Self::Withdrawn)
    }

    /// Statuses that count as "in progress" when picking a current version.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Self::Draft | Self::UnderReview | Self::AmendmentReview
        )
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        if normalized == "PUBLISHED" {
            return Ok(Self::Active);
        }
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownStatus(s.to_string()))
    }
}

/// An action a user can take on a protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionAction {
    Edit,
    Submit,
    Approve,
    Activate,
}

impl VersionAction {
    pub const ALL: [VersionAction; 4] = [
        VersionAction::Edit,
        VersionAction::Submit,
        VersionAction::Approve,
        VersionAction::Activate,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Activate => "activate",
        }
    }

    /// Status the version moves to when the action is performed.
    ///
    /// The target is fixed per action, independent of the originating status.
    /// Editing changes content, not status.
    #[must_use]
    pub const fn target_status(&self) -> Option<VersionStatus> {
        match self {
            Self::Edit => None,
            Self::Submit => Some(VersionStatus::UnderReview),
            Self::Approve => Some(VersionStatus::Approved),
            Self::Activate => Some(VersionStatus::Active),
        }
    }
}

impl fmt::Display for VersionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionAction {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_draft_is_editable() {
        for status in VersionStatus::ALL {
            assert_eq!(
                status.allows(VersionAction::Edit),
                status == VersionStatus::Draft,
                "{status}"
            );
        }
    }

    #[test]
    fn test_action_targets_are_fixed() {
        assert_eq!(VersionAction::Edit.target_status(), None);
        assert_eq!(
            VersionAction::Submit.target_status(),
            Some(VersionStatus::UnderReview)
        );
        assert_eq!(
            VersionAction::Approve.target_status(),
            Some(VersionStatus::Approved)
        );
        assert_eq!(
            VersionAction::Activate.target_status(),
            Some(VersionStatus::Active)
        );
    }

    #[test]
    fn test_allowed_actions() {
        assert_eq!(
            VersionStatus::Draft.allowed_actions(),
            vec![VersionAction::Edit, VersionAction::Submit]
        );
        assert!(VersionStatus::Active.allowed_actions().is_empty());
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = VersionStatus::ALL
            .into_iter()
            .filter(VersionStatus::is_terminal)
            .collect();
        assert_eq!(
            terminal,
            vec![VersionStatus::Superseded, VersionStatus::Withdrawn]
        );
    }

    #[test]
    fn test_published_alias() {
        assert_eq!("published".parse(), Ok(VersionStatus::Active));
        let parsed: VersionStatus = serde_json::from_str("\"PUBLISHED\"").unwrap();
        assert_eq!(parsed, VersionStatus::Active);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"ACTIVE\"");
    }

    #[test]
    fn test_parse_status_variants() {
        assert_eq!("under review".parse(), Ok(VersionStatus::UnderReview));
        assert_eq!(
            "amendment-review".parse(),
            Ok(VersionStatus::AmendmentReview)
        );
        assert!("archived".parse::<VersionStatus>().is_err());
    }
}
