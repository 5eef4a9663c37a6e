use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use object_store::path::Path;
use object_store::ObjectStore;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::StorageError;

/// Prefix under which in-flight multipart parts are staged until a
/// transfer is composed into its final object.
const UPLOAD_PREFIX: &str = "_uploads";

/// What a verification pass learned about a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStat {
    pub size: u64,
    /// Hex-encoded SHA-256 of the object's bytes.
    pub sha256: String,
}

/// Thin handle over the configured object store.
///
/// Objects are addressed by a logical `(bucket, key)` pair; buckets map to
/// top-level prefixes inside the configured backend, so one deployment can
/// host several catalogs against a single S3 bucket or directory.
#[derive(Debug, Clone)]
pub struct Storage {
    inner: Arc<dyn ObjectStore>,
}

impl Storage {
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Ok(Self {
            inner: config.build()?,
        })
    }

    /// In-process store, used by tests and scratch servers.
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(object_store::memory::InMemory::new()),
        }
    }

    fn object_path(bucket: &str, key: &str) -> Path {
        Path::from(format!("{}/{}", bucket, key))
    }

    fn part_path(bucket: &str, upload_id: &str, part: u32) -> Path {
        Path::from(format!("{}/{}/{}/{:05}", bucket, UPLOAD_PREFIX, upload_id, part))
    }

    /// Fresh token identifying one multipart transfer session.
    pub fn new_upload_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    pub async fn put(&self, bucket: &str, key: &str, bytes: Bytes) -> Result<(), StorageError> {
        debug!(bucket, key, size = bytes.len(), "storing object");
        self.inner
            .put(&Self::object_path(bucket, key), bytes.into())
            .await?;
        Ok(())
    }

    pub async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let path = Self::object_path(bucket, key);
        match self.inner.get(&path).await {
            Ok(result) => Ok(result.bytes().await?),
            Err(object_store::Error::NotFound { .. }) => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stream an object's bytes without buffering it whole.
    pub async fn get_stream(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<BoxStream<'static, Result<Bytes, object_store::Error>>, StorageError> {
        let path = Self::object_path(bucket, key);
        match self.inner.get(&path).await {
            Ok(result) => Ok(result.into_stream()),
            Err(object_store::Error::NotFound { .. }) => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Size and SHA-256 of a stored object, computed by streaming it in
    /// chunks. Returns `None` when the object does not exist.
    pub async fn stat(&self, bucket: &str, key: &str) -> Result<Option<ObjectStat>, StorageError> {
        let path = Self::object_path(bucket, key);
        let result = match self.inner.get(&path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut stream = result.into_stream();
        let mut hasher = Sha256::new();
        let mut size: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            size += chunk.len() as u64;
            hasher.update(&chunk);
        }

        Ok(Some(ObjectStat {
            size,
            sha256: hex::encode(hasher.finalize()),
        }))
    }

    /// Size of a stored object from backend metadata alone, without
    /// reading its bytes. Returns `None` when the object does not exist.
    pub async fn size(&self, bucket: &str, key: &str) -> Result<Option<u64>, StorageError> {
        match self.inner.head(&Self::object_path(bucket, key)).await {
            Ok(meta) => Ok(Some(meta.size as u64)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an object. Deleting something that is already gone is fine.
    pub async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        match self.inner.delete(&Self::object_path(bucket, key)).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Stage one part of a multipart transfer. Parts are numbered from 1.
    pub async fn put_part(
        &self,
        bucket: &str,
        upload_id: &str,
        part: u32,
        bytes: Bytes,
    ) -> Result<(), StorageError> {
        self.inner
            .put(&Self::part_path(bucket, upload_id, part), bytes.into())
            .await?;
        Ok(())
    }

    /// Stitch staged parts 1..=`parts` into the final object at `key`,
    /// then drop the staging area. A missing part fails the compose and
    /// leaves staged parts in place for a retry.
    pub async fn compose(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: u32,
    ) -> Result<(), StorageError> {
        let mut upload = self
            .inner
            .put_multipart(&Self::object_path(bucket, key))
            .await?;

        for part in 1..=parts {
            let path = Self::part_path(bucket, upload_id, part);
            let staged = match self.inner.get(&path).await {
                Ok(result) => result.bytes().await?,
                Err(object_store::Error::NotFound { .. }) => {
                    let _ = upload.abort().await;
                    return Err(StorageError::NotFound(path.to_string()));
                }
                Err(e) => {
                    let _ = upload.abort().await;
                    return Err(e.into());
                }
            };
            upload.put_part(staged.into()).await?;
        }
        upload.complete().await?;
        info!(bucket, key, upload = upload_id, parts, "multipart transfer composed");

        self.abort_upload(bucket, upload_id).await?;
        Ok(())
    }

    /// Drop every staged part of a transfer session.
    pub async fn abort_upload(&self, bucket: &str, upload_id: &str) -> Result<(), StorageError> {
        let prefix = Path::from(format!("{}/{}/{}", bucket, UPLOAD_PREFIX, upload_id));
        let mut listing = self.inner.list(Some(&prefix));
        let mut staged = Vec::new();
        while let Some(meta) = listing.next().await {
            staged.push(meta?.location);
        }
        for location in staged {
            match self.inner.delete(&location).await {
                Ok(()) | Err(object_store::Error::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
