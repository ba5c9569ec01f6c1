//! Protocol version numbering.
//!
//! Version numbers are `major.minor` strings with an optional `.patch`
//! component (e.g. "1.0", "2.3", "1.2.1"). They order numerically, so
//! "1.10" sorts after "1.9".
//!
//! Two parsers are provided:
//!
//! - [`VersionNumber::parse`] is lenient: missing or non-numeric components
//!   read as zero. It is used for ordering whatever the repository returns.
//! - [`VersionNumber::from_str`] is strict and is used to validate numbers
//!   supplied by a caller.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::amendment::AmendmentType;
use crate::error::{ModelError, Result};

/// Number assigned to the first version of a study.
pub const INITIAL_VERSION: &str = "1.0";

/// A parsed protocol version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VersionNumber {
    /// Major version number.
    pub major: u32,
    /// Minor version number.
    pub minor: u32,
    /// Patch version number (zero when absent).
    pub patch: u32,
}

impl VersionNumber {
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse leniently: components beyond the third are ignored, missing or
    /// non-numeric components become zero and numeric components too large
    /// for `u32` saturate.
    #[must_use]
    pub fn parse(version: &str) -> Self {
        let mut parts = version.trim().split('.').map(lenient_component);
        let major = parts.next().unwrap_or(0);
        let minor = parts.next().unwrap_or(0);
        let patch = parts.next().unwrap_or(0);
        Self::new(major, minor, patch)
    }

    /// The number that follows this one for the given amendment.
    ///
    /// Major and safety amendments start a new major line; everything else,
    /// including initial and administrative amendments, bumps the minor.
    /// The patch component is always dropped.
    #[must_use]
    pub fn next(&self, amendment: AmendmentType) -> Self {
        match amendment {
            AmendmentType::Major | AmendmentType::Safety => {
                Self::new(self.major.saturating_add(1), 0, 0)
            }
            AmendmentType::Minor | AmendmentType::Administrative | AmendmentType::Initial => {
                Self::new(self.major, self.minor.saturating_add(1), 0)
            }
        }
    }
}

impl FromStr for VersionNumber {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || ModelError::InvalidVersionNumber(s.to_string());

        let parts: Vec<&str> = trimmed.split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(invalid());
        }

        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse().map_err(|_| invalid())?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.patch != 0 {
            write!(f, ".{}", self.patch)?;
        }
        Ok(())
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.major.cmp(&other.major) {
            Ordering::Equal => {}
            other => return other,
        }
        match self.minor.cmp(&other.minor) {
            Ordering::Equal => {}
            other => return other,
        }
        self.patch.cmp(&other.patch)
    }
}

fn lenient_component(part: &str) -> u32 {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    part.parse().unwrap_or(u32::MAX)
}

/// Compare two version number strings numerically.
#[must_use]
pub fn compare_version_numbers(a: &str, b: &str) -> Ordering {
    VersionNumber::parse(a).cmp(&VersionNumber::parse(b))
}

/// Generate the number for a new version.
///
/// Returns [`INITIAL_VERSION`] when the study has no versions yet.
#[must_use]
pub fn generate_next_version_number(latest: Option<&str>, amendment: AmendmentType) -> String {
    match latest {
        None => INITIAL_VERSION.to_string(),
        Some(latest) => VersionNumber::parse(latest).next(amendment).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_components() {
        let v = VersionNumber::parse("2.3");
        assert_eq!(v, VersionNumber::new(2, 3, 0));
    }

    #[test]
    fn test_parse_defaults_missing_and_garbage_to_zero() {
        assert_eq!(VersionNumber::parse("4"), VersionNumber::new(4, 0, 0));
        assert_eq!(VersionNumber::parse("1.x.7"), VersionNumber::new(1, 0, 7));
        assert_eq!(VersionNumber::parse(""), VersionNumber::default());
    }

    #[test]
    fn test_parse_saturates_oversized_components() {
        assert_eq!(
            VersionNumber::parse("5000000000.0"),
            VersionNumber::new(u32::MAX, 0, 0)
        );
        assert_eq!(
            compare_version_numbers("5000000000.0", "1.0"),
            Ordering::Greater
        );
        assert_eq!(VersionNumber::parse("+3.1"), VersionNumber::new(0, 1, 0));
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare_version_numbers("1.0", "1.1"), Ordering::Less);
        assert_eq!(compare_version_numbers("2.0", "1.9"), Ordering::Greater);
        assert_eq!(compare_version_numbers("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_version_numbers("1.10", "1.9"), Ordering::Greater);
    }

    #[test]
    fn test_generate_next() {
        assert_eq!(
            generate_next_version_number(None, AmendmentType::Minor),
            "1.0"
        );
        assert_eq!(
            generate_next_version_number(Some("1.0"), AmendmentType::Minor),
            "1.1"
        );
        assert_eq!(
            generate_next_version_number(Some("1.5"), AmendmentType::Major),
            "2.0"
        );
        assert_eq!(
            generate_next_version_number(Some("2.3"), AmendmentType::Safety),
            "3.0"
        );
        assert_eq!(
            generate_next_version_number(Some("1.3"), AmendmentType::Administrative),
            "1.4"
        );
    }

    #[test]
    fn test_next_drops_patch() {
        assert_eq!(
            generate_next_version_number(Some("1.3.2"), AmendmentType::Minor),
            "1.4"
        );
    }

    #[test]
    fn test_strict_parse() {
        assert_eq!(
            "1.2.3".parse::<VersionNumber>().unwrap(),
            VersionNumber::new(1, 2, 3)
        );
        assert!("1".parse::<VersionNumber>().is_err());
        assert!("1.2.3.4".parse::<VersionNumber>().is_err());
        assert!("1.b".parse::<VersionNumber>().is_err());
        assert!("1.".parse::<VersionNumber>().is_err());
        assert!("-1.0".parse::<VersionNumber>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(VersionNumber::new(1, 4, 0).to_string(), "1.4");
        assert_eq!(VersionNumber::new(1, 4, 2).to_string(), "1.4.2");
    }
}
