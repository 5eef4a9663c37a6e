//! Client-side source cache.
//!
//! Plain directories of verified files, stacked into tiers: a shared
//! read-only tier (say, a lab NFS mount) in front of or behind a private
//! writeable one. Synchronous on purpose; there is no daemon, and the
//! consumers are CLI invocations and analysis scripts.
//!
//! Writes go through a temp file and an atomic rename, with a per-tier
//! advisory file lock serializing mutations across processes. Reads take
//! no lock; they rely on the rename being atomic and re-verify file
//! contents before returning a hit.

mod multi;
mod tier;

pub use multi::MultiCache;
pub use tier::{CacheEntry, Tier};

use uuid::Uuid;

use crate::catalog::SourceFile;
use crate::checksum::Checksum;
use crate::service::SourceLink;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("no writeable cache tier configured")]
    NotWriteable,

    #[error("cache entry {name}: checksum mismatch (expected {expected}, got {actual})")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("cache entry {name}: {size} bytes on disk, {expected} recorded")]
    SizeMismatch {
        name: String,
        size: u64,
        expected: u64,
    },

    #[error("source {0} is not available for download yet")]
    NotAvailable(String),

    #[error("cache index at {path}: {reason}")]
    Index { path: String, reason: String },

    #[error("download failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What the cache records about a file, enough to verify it later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub checksum: Checksum,
}

impl From<&SourceFile> for CacheKey {
    fn from(source: &SourceFile) -> Self {
        Self {
            id: source.id,
            name: source.name.clone(),
            size: source.size,
            checksum: source.checksum.clone(),
        }
    }
}

impl From<&SourceLink> for CacheKey {
    fn from(link: &SourceLink) -> Self {
        Self {
            id: link.id,
            name: link.name.clone(),
            size: link.size,
            checksum: link.checksum.clone(),
        }
    }
}
