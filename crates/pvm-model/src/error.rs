//! Error types for the protocol version model.

use thiserror::Error;

/// Errors raised while parsing or validating model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// Version number is not `major.minor` or `major.minor.patch`.
    #[error("invalid version number: {0:?}")]
    InvalidVersionNumber(String),

    /// Status string does not name a lifecycle status.
    #[error("unknown protocol version status: {0:?}")]
    UnknownStatus(String),

    /// Amendment string does not name an amendment type.
    #[error("unknown amendment type: {0:?}")]
    UnknownAmendmentType(String),

    /// Action string does not name a lifecycle action.
    #[error("unknown version action: {0:?}")]
    UnknownAction(String),

    /// Study identifier is empty or whitespace.
    #[error("study id must not be blank")]
    BlankStudyId,
}

pub type Result<T> = std::result::Result<T, ModelError>;
