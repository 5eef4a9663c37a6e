//! Version labels for product chains.
//!
//! Labels are plain `MAJOR.MINOR.PATCH` strings; an update bumps one
//! component and zeroes the ones below it.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Which component of the version label an update bumps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Revision {
    Major,
    #[default]
    Minor,
    Patch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionLabel {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl VersionLabel {
    /// The label every new chain starts at.
    pub fn initial() -> Self {
        Self {
            major: 1,
            minor: 0,
            patch: 0,
        }
    }

    pub fn bump(self, level: Revision) -> Self {
        match level {
            Revision::Major => Self {
                major: self.major + 1,
                minor: 0,
                patch: 0,
            },
            Revision::Minor => Self {
                minor: self.minor + 1,
                patch: 0,
                ..self
            },
            Revision::Patch => Self {
                patch: self.patch + 1,
                ..self
            },
        }
    }
}

impl Default for VersionLabel {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid version label `{0}`: expected `major.minor.patch`")]
pub struct VersionParseError(String);

impl FromStr for VersionLabel {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let mut next = || {
            parts
                .next()
                .and_then(|p| p.parse::<u32>().ok())
                .ok_or_else(|| VersionParseError(s.to_string()))
        };
        let (major, minor, patch) = (next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(VersionParseError(s.to_string()));
        }
        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl Serialize for VersionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_levels() {
        let v = VersionLabel::initial();
        assert_eq!(v.to_string(), "1.0.0");
        assert_eq!(v.bump(Revision::Patch).to_string(), "1.0.1");
        assert_eq!(v.bump(Revision::Minor).to_string(), "1.1.0");
        assert_eq!(
            v.bump(Revision::Minor).bump(Revision::Major).to_string(),
            "2.0.0"
        );
    }

    #[test]
    fn parse_roundtrip() {
        let v: VersionLabel = "3.14.1".parse().unwrap();
        assert_eq!(
            v,
            VersionLabel {
                major: 3,
                minor: 14,
                patch: 1
            }
        );
        assert!("3.14".parse::<VersionLabel>().is_err());
        assert!("3.14.1.5".parse::<VersionLabel>().is_err());
        assert!("a.b.c".parse::<VersionLabel>().is_err());
    }
}
