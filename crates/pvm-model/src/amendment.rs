//! Amendment classification for protocol versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Why a protocol version was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmendmentType {
    /// First protocol version of a study.
    Initial,
    /// Changes affecting safety or efficacy.
    Major,
    /// Small, non-substantial changes.
    Minor,
    /// Safety-related changes.
    Safety,
    /// Administrative, non-substantial changes.
    Administrative,
}

/// Display metadata for an amendment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AmendmentTypeInfo {
    pub value: AmendmentType,
    pub label: &'static str,
    pub description: &'static str,
}

impl AmendmentType {
    /// Every amendment type, in display order.
    pub const ALL: [AmendmentType; 5] = [
        AmendmentType::Initial,
        AmendmentType::Major,
        AmendmentType::Minor,
        AmendmentType::Safety,
        AmendmentType::Administrative,
    ];

    /// Canonical wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::Major => "MAJOR",
            Self::Minor => "MINOR",
            Self::Safety => "SAFETY",
            Self::Administrative => "ADMINISTRATIVE",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Initial => "Initial Protocol",
            Self::Major => "Major Amendment",
            Self::Minor => "Minor Amendment",
            Self::Safety => "Safety Amendment",
            Self::Administrative => "Administrative Amendment",
        }
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Initial => "Initial protocol version",
            Self::Major => "Protocol changes affecting safety/efficacy",
            Self::Minor => "Administrative changes",
            Self::Safety => "Safety-related changes",
            Self::Administrative => "Non-substantial changes",
        }
    }

    /// Change summary recorded when the author leaves it blank.
    #[must_use]
    pub const fn default_changes_summary(&self) -> &'static str {
        match self {
            Self::Initial => "Initial protocol version",
            Self::Major => "Major protocol amendment",
            Self::Minor => "Minor protocol amendment",
            Self::Safety => "Safety-related protocol amendment",
            Self::Administrative => "Administrative protocol amendment",
        }
    }

    /// Major and safety amendments must go through IRB/EC approval.
    #[must_use]
    pub const fn requires_regulatory_approval(&self) -> bool {
        matches!(self, Self::Major | Self::Safety)
    }

    #[must_use]
    pub const fn info(&self) -> AmendmentTypeInfo {
        AmendmentTypeInfo {
            value: *self,
            label: self.label(),
            description: self.description(),
        }
    }
}

impl fmt::Display for AmendmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AmendmentType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|amendment| amendment.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownAmendmentType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("safety".parse::<AmendmentType>(), Ok(AmendmentType::Safety));
        assert_eq!(
            " Administrative ".parse::<AmendmentType>(),
            Ok(AmendmentType::Administrative)
        );
        assert!("cosmetic".parse::<AmendmentType>().is_err());
    }

    #[test]
    fn test_regulatory_approval_required_for_major_and_safety() {
        let required: Vec<_> = AmendmentType::ALL
            .into_iter()
            .filter(AmendmentType::requires_regulatory_approval)
            .collect();
        assert_eq!(required, vec![AmendmentType::Major, AmendmentType::Safety]);
    }

    #[test]
    fn test_serde_uses_screaming_case() {
        let json = serde_json::to_string(&AmendmentType::Administrative).unwrap();
        assert_eq!(json, "\"ADMINISTRATIVE\"");
    }
}
