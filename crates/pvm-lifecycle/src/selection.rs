//! Ordering of a study's versions and derivation of its current version.

use std::cmp::Ordering;

use pvm_model::{ProtocolVersion, VersionStatus};

/// Sort newest first: descending by version number, then by creation time.
/// Versions without a creation time sort after dated ones of the same number.
pub fn sort_versions(versions: &mut [ProtocolVersion]) {
    versions.sort_by(newest_first);
}

fn newest_first(a: &ProtocolVersion, b: &ProtocolVersion) -> Ordering {
    b.number()
        .cmp(&a.number())
        .then_with(|| b.created_date.cmp(&a.created_date))
}

/// The version that currently governs the study.
///
/// Preference order: the active version, then an approved one, then one still
/// in progress (draft or under either review), then whatever sorts first.
/// Expects `versions` to be sorted with [`sort_versions`].
#[must_use]
pub fn derive_current_version(versions: &[ProtocolVersion]) -> Option<&ProtocolVersion> {
    versions
        .iter()
        .find(|v| v.status == VersionStatus::Active)
        .or_else(|| versions.iter().find(|v| v.status == VersionStatus::Approved))
        .or_else(|| versions.iter().find(|v| v.status.is_in_progress()))
        .or_else(|| versions.first())
}
