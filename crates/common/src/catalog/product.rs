//! Product version nodes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::Protected;
use crate::catalog::collection::CollectionPolicy;
use crate::catalog::file::SourceFile;
use crate::catalog::metadata::Metadata;
use crate::catalog::version::VersionLabel;

/// Where a version node sits in the upload lifecycle.
///
/// The order is meaningful: transitions never move backward, and a failed
/// confirm leaves a node at `Completed` for a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadState {
    /// The node and its file records exist; no transfer URLs issued yet.
    Pending,
    /// Pre-signed write URLs are in clients' hands.
    Transferring,
    /// Part counts and sizes checked out and multipart sessions are closed.
    Completed,
    /// Every source verified in storage. Terminal.
    Available,
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UploadState::Pending => "pending",
            UploadState::Transferring => "transferring",
            UploadState::Completed => "completed",
            UploadState::Available => "available",
        };
        f.write_str(s)
    }
}

/// A (collection, policy) tag on a version node. The collection side is
/// derived from these, never stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub collection: Uuid,
    pub policy: CollectionPolicy,
}

/// One version node of a data product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    /// Unique among *current* nodes; superseded versions may share it.
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub uploaded: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub current: bool,
    pub version: VersionLabel,
    pub state: UploadState,
    #[serde(default)]
    pub sources: Vec<SourceFile>,
    /// The node this one supersedes, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<Uuid>,
    /// Mirrored relationship edges; both ends are stored.
    #[serde(default)]
    pub child_of: Vec<Uuid>,
    #[serde(default)]
    pub parent_of: Vec<Uuid>,
    #[serde(default)]
    pub collections: Vec<Membership>,
    pub owner: String,
    #[serde(default)]
    pub readers: Vec<String>,
    #[serde(default)]
    pub writers: Vec<String>,
}

impl Product {
    pub fn source(&self, name: &str) -> Option<&SourceFile> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn source_mut(&mut self, name: &str) -> Option<&mut SourceFile> {
        self.sources.iter_mut().find(|s| s.name == name)
    }

    pub fn membership(&self, collection: Uuid) -> Option<&Membership> {
        self.collections.iter().find(|m| m.collection == collection)
    }

    pub fn all_sources_available(&self) -> bool {
        self.sources.iter().all(|s| s.available)
    }
}

impl Protected for Product {
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
    fn upload_states_are_ordered() {
        assert!(UploadState::Pending < UploadState::Transferring);
        assert!(UploadState::Transferring < UploadState::Completed);
        assert!(UploadState::Completed < UploadState::Available);
    }
}
