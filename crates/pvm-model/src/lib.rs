//! Data model for protocol version lifecycle management.
//!
//! - [`numbering`]: parsing, comparison and generation of version numbers
//! - [`status`]: lifecycle statuses and the capability policy that gates actions
//! - [`amendment`]: amendment classification
//! - [`version`]: the [`ProtocolVersion`] entity and its create/update inputs

pub mod amendment;
pub mod error;
pub mod numbering;
pub mod status;
pub mod version;

pub use amendment::{AmendmentType, AmendmentTypeInfo};
pub use error::{ModelError, Result};
pub use numbering::{
    INITIAL_VERSION, VersionNumber, compare_version_numbers, generate_next_version_number,
};
pub use status::{StatusInfo, VersionAction, VersionStatus};
pub use version::{
    NewProtocolVersion, ProtocolVersion, StudyId, VersionCreateInput, VersionId, VersionUpdate,
    can_perform_action, normalize_text,
};
