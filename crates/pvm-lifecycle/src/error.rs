//! Error types for repositories and the lifecycle manager.
//!
//! Every failure the manager reports collapses to one human-readable string
//! ([`LifecycleError::user_message`]) stored in the manager's error slot; the
//! structured error is also returned to the caller.

use pvm_model::{ModelError, StudyId, VersionAction, VersionId, VersionStatus};
use thiserror::Error;

/// Failure reported by a [`ProtocolVersionRepository`](crate::ProtocolVersionRepository).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RepositoryError {
    /// No version with this identifier exists.
    #[error("protocol version {0} not found")]
    NotFound(VersionId),

    /// A version with the same number already exists for the study.
    #[error("version {version_number} already exists for study {study_id}")]
    DuplicateVersionNumber {
        study_id: StudyId,
        version_number: String,
    },

    /// Superseded and withdrawn versions never change status again.
    #[error("protocol version {version_id} is {status} and can no longer change status")]
    TerminalStatus {
        version_id: VersionId,
        status: VersionStatus,
    },

    /// The request was understood but refused.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The backing store failed.
    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The service could not be reached.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Storage failure wrapping an underlying error.
    pub fn storage(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Failure of a lifecycle manager operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LifecycleError {
    /// The manager has no valid study to work on.
    #[error("invalid study id: {0:?}")]
    InvalidStudyId(String),

    /// The version is not part of the loaded version set.
    #[error("protocol version {0} is not loaded for this study")]
    VersionNotFound(VersionId),

    /// The status policy forbids the action.
    #[error("cannot {action} protocol version {version_id} while it is {status}")]
    ActionNotAllowed {
        action: VersionAction,
        version_id: VersionId,
        status: VersionStatus,
    },

    /// Only drafts can be deleted.
    #[error("only DRAFT versions can be deleted; protocol version {version_id} is {status}")]
    DeleteRequiresDraft {
        version_id: VersionId,
        status: VersionStatus,
    },

    /// Caller input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LifecycleError {
    /// Message suitable for the manager's error slot and for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidStudyId(_) => "Invalid study ID".to_string(),
            Self::VersionNotFound(id) => {
                format!("Protocol version {id} was not found. Reload the version list and try again.")
            }
            Self::ActionNotAllowed {
                action, status, ..
            } => format!(
                "A protocol version in {} status cannot be {}.",
                status.label(),
                past_participle(*action)
            ),
            Self::DeleteRequiresDraft { status, .. } => format!(
                "Only draft protocol versions can be deleted (this version is {}).",
                status.label()
            ),
            Self::Validation(message) => message.clone(),
            Self::Model(error) => error.to_string(),
            Self::Repository(error) => error.to_string(),
        }
    }
}

fn past_participle(action: VersionAction) -> &'static str {
    match action {
        VersionAction::Edit => "edited",
        VersionAction::Submit => "submitted for review",
        VersionAction::Approve => "approved",
        VersionAction::Activate => "activated",
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_not_allowed_message() {
        let error = LifecycleError::ActionNotAllowed {
            action: VersionAction::Activate,
            version_id: VersionId(4),
            status: VersionStatus::Draft,
        };
        assert_eq!(
            error.user_message(),
            "A protocol version in Initial Draft status cannot be activated."
        );
        assert_eq!(
            error.to_string(),
            "cannot activate protocol version 4 while it is DRAFT"
        );
    }

    #[test]
    fn test_repository_message_passes_through() {
        let error = LifecycleError::from(RepositoryError::Unavailable("timeout".to_string()));
        assert_eq!(error.user_message(), "service unavailable: timeout");
    }
}
