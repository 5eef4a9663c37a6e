//! Collections: named groupings of products.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::Protected;

/// How a collection tracks a product's versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionPolicy {
    /// Every version, past and future, belongs.
    All,
    /// Versions from the tag onward belong; older ones do not.
    New,
    /// Exactly one member: whichever version is current.
    Current,
    /// Pinned to the exact version that was tagged.
    Fixed,
}

impl fmt::Display for CollectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CollectionPolicy::All => "all",
            CollectionPolicy::New => "new",
            CollectionPolicy::Current => "current",
            CollectionPolicy::Fixed => "fixed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown collection policy `{0}`")]
pub struct PolicyParseError(String);

impl FromStr for CollectionPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(CollectionPolicy::All),
            "new" => Ok(CollectionPolicy::New),
            "current" => Ok(CollectionPolicy::Current),
            "fixed" => Ok(CollectionPolicy::Fixed),
            _ => Err(PolicyParseError(s.to_string())),
        }
    }
}

/// A collection document. Membership lives on product nodes; the visible
/// product set is computed at read time from those tags. Collections are
/// mutated in place, they do not version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Mirrored nesting edges, maintained like product relationships.
    #[serde(default)]
    pub child_collections: Vec<Uuid>,
    #[serde(default)]
    pub parent_collections: Vec<Uuid>,
    pub owner: String,
    #[serde(default)]
    pub readers: Vec<String>,
    #[serde(default)]
    pub writers: Vec<String>,
}

impl Protected for Collection {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn readers(&self) -> &[String] {
        &self.readers
    }

    fn writers(&self) -> &[String] {
        &self.writers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!(
            "CURRENT".parse::<CollectionPolicy>().unwrap(),
            CollectionPolicy::Current
        );
        assert!("sometimes".parse::<CollectionPolicy>().is_err());
    }

    #[test]
    fn policy_serializes_lowercase() {
        let json = serde_json::to_string(&CollectionPolicy::Fixed).unwrap();
        assert_eq!(json, "\"fixed\"");
    }
}
