//! Source files attached to a product version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checksum::Checksum;

/// A source declared by a client at create/update time, before any bytes
/// have moved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSource {
    pub name: String,
    pub size: u64,
    pub checksum: Checksum,
}

/// One binary file belonging to a product version.
///
/// A source is owned by exactly one version node: update operations that
/// keep a source copy this record (same object key) into the new node, so
/// the bytes are shared but the bookkeeping is not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: Uuid,
    pub name: String,
    pub uploader: String,
    /// Logical bucket inside the object store.
    pub bucket: String,
    /// Object key, `{id}/{name}`.
    pub key: String,
    pub size: u64,
    pub checksum: Checksum,
    /// Set only once a confirm pass has verified the stored object.
    pub available: bool,
    pub uploaded: DateTime<Utc>,

    // Multipart bookkeeping. Sources small enough for a single transfer
    // keep `multipart = false` and a part count of 1.
    pub multipart: bool,
    pub number_of_parts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multipart_batch_size: Option<u64>,
    #[serde(default)]
    pub multipart_closed: bool,
}

impl SourceFile {
    /// Build the record for a freshly declared source. The multipart
    /// session token is attached by the service when parts > 1.
    pub fn new(new: NewSource, uploader: &str, bucket: &str, batch_size: Option<u64>) -> Self {
        let id = Uuid::new_v4();
        let parts = part_count(new.size, batch_size);
        Self {
            key: format!("{}/{}", id, new.name),
            id,
            name: new.name,
            uploader: uploader.to_string(),
            bucket: bucket.to_string(),
            size: new.size,
            checksum: new.checksum,
            available: false,
            uploaded: Utc::now(),
            multipart: parts > 1,
            number_of_parts: parts,
            upload_id: None,
            multipart_batch_size: if parts > 1 { batch_size } else { None },
            multipart_closed: false,
        }
    }
}

/// How many transfer parts a source of `size` bytes needs under an
/// optional batch size: `ceil(size / batch)`, never less than 1.
pub fn part_count(size: u64, batch_size: Option<u64>) -> u32 {
    match batch_size {
        Some(batch) if batch > 0 && size > batch => size.div_ceil(batch) as u32,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_count_follows_ceil_rule() {
        assert_eq!(part_count(10, None), 1);
        assert_eq!(part_count(10, Some(0)), 1);
        assert_eq!(part_count(10, Some(100)), 1);
        assert_eq!(part_count(100, Some(100)), 1);
        assert_eq!(part_count(101, Some(100)), 2);
        assert_eq!(part_count(250, Some(100)), 3);
        assert_eq!(part_count(0, Some(100)), 1);
    }

    #[test]
    fn single_part_sources_are_not_multipart() {
        let source = SourceFile::new(
            NewSource {
                name: "map.fits".into(),
                size: 64,
                checksum: Checksum::sha256_of(b"x"),
            },
            "uploader",
            "granary",
            Some(1024),
        );
        assert!(!source.multipart);
        assert_eq!(source.number_of_parts, 1);
        assert!(source.multipart_batch_size.is_none());
        assert_eq!(source.key, format!("{}/map.fits", source.id));
    }

    #[test]
    fn large_sources_split_into_parts() {
        let source = SourceFile::new(
            NewSource {
                name: "tod.h5".into(),
                size: 2_500,
                checksum: Checksum::sha256_of(b"x"),
            },
            "uploader",
            "granary",
            Some(1_000),
        );
        assert!(source.multipart);
        assert_eq!(source.number_of_parts, 3);
        assert_eq!(source.multipart_batch_size, Some(1_000));
        assert!(!source.multipart_closed);
    }
}
