//! Shared enumerations used across modules
//!
//! Learner proficiency levels and target operating systems. Both parse
//! case-insensitively; an unrecognized value is a hard parse error while a
//! blank value falls back to the default tier (see `from_form_value`).

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Unrecognized learning level string
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized learning level: {0:?}")]
pub struct ParseLevelError(pub String);

/// Unrecognized target OS string
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized target OS: {0:?}")]
pub struct ParseOsError(pub String);

/// Learner proficiency tier. Ordering matters: a learner at a given level may
/// access any content whose minimum level compares less or equal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LearningLevel {
    #[default]
    Newbie,
    Pro,
    Hero,
}

impl LearningLevel {
    /// Parse a form value: blank falls back to `Newbie`, anything else must
    /// be a recognized level.
    pub fn from_form_value(value: &str) -> Result<Self, ParseLevelError> {
        if value.trim().is_empty() {
            return Ok(Self::Newbie);
        }
        value.parse()
    }

    /// Whether this level grants access to content with the given minimum
    /// level. Blank or absent minimum means unrestricted. An unparsable
    /// minimum is a content error, not a silent deny.
    pub fn allows(&self, min_level: Option<&str>) -> Result<bool, ParseLevelError> {
        match min_level {
            None => Ok(true),
            Some(min) if min.trim().is_empty() => Ok(true),
            Some(min) => Ok(*self >= min.parse()?),
        }
    }
}

impl FromStr for LearningLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NEWBIE" => Ok(Self::Newbie),
            "PRO" => Ok(Self::Pro),
            "HERO" => Ok(Self::Hero),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl std::fmt::Display for LearningLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Newbie => write!(f, "NEWBIE"),
            Self::Pro => write!(f, "PRO"),
            Self::Hero => write!(f, "HERO"),
        }
    }
}

/// Operating system a section is written for. `Any` matches every context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetOs {
    #[default]
    Any,
    Windows,
    Linux,
    Mac,
    Wsl,
}

impl TargetOs {
    /// Parse a form value: blank falls back to `Any`.
    pub fn from_form_value(value: &str) -> Result<Self, ParseOsError> {
        if value.trim().is_empty() {
            return Ok(Self::Any);
        }
        value.parse()
    }

    /// Canonical uppercase name, as it appears in content files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::Windows => "WINDOWS",
            Self::Linux => "LINUX",
            Self::Mac => "MAC",
            Self::Wsl => "WSL",
        }
    }
}

impl FromStr for TargetOs {
    type Err = ParseOsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ANY" => Ok(Self::Any),
            "WINDOWS" => Ok(Self::Windows),
            "LINUX" => Ok(Self::Linux),
            "MAC" => Ok(Self::Mac),
            "WSL" => Ok(Self::Wsl),
            _ => Err(ParseOsError(s.to_string())),
        }
    }
}

impl std::fmt::Display for TargetOs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LearningLevel::Newbie < LearningLevel::Pro);
        assert!(LearningLevel::Pro < LearningLevel::Hero);
    }

    #[test]
    fn test_level_allows_blank_means_unrestricted() {
        assert!(LearningLevel::Newbie.allows(None).unwrap());
        assert!(LearningLevel::Newbie.allows(Some("")).unwrap());
        assert!(LearningLevel::Newbie.allows(Some("  ")).unwrap());
    }

    #[test]
    fn test_level_allows_ordinal() {
        assert!(LearningLevel::Hero.allows(Some("newbie")).unwrap());
        assert!(LearningLevel::Pro.allows(Some("PRO")).unwrap());
        assert!(!LearningLevel::Newbie.allows(Some("hero")).unwrap());
    }

    #[test]
    fn test_level_allows_rejects_garbage() {
        assert!(LearningLevel::Hero.allows(Some("wizard")).is_err());
    }

    #[test]
    fn test_level_form_value() {
        assert_eq!(
            LearningLevel::from_form_value("").unwrap(),
            LearningLevel::Newbie
        );
        assert_eq!(
            LearningLevel::from_form_value("pro").unwrap(),
            LearningLevel::Pro
        );
        assert!(LearningLevel::from_form_value("guru").is_err());
    }

    #[test]
    fn test_os_parsing() {
        assert_eq!("linux".parse::<TargetOs>().unwrap(), TargetOs::Linux);
        assert_eq!(TargetOs::from_form_value("").unwrap(), TargetOs::Any);
        assert!("beos".parse::<TargetOs>().is_err());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&LearningLevel::Newbie).unwrap(),
            "\"NEWBIE\""
        );
        assert_eq!(serde_json::to_string(&TargetOs::Wsl).unwrap(), "\"WSL\"");
    }
}
