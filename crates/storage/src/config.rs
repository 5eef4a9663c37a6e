use std::path::PathBuf;
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Backend selection for the object store, deserialized from service config.
///
/// `memory` keeps everything in process (tests, scratch servers), `local`
/// roots objects under a directory, `s3` talks to any S3-compatible endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    #[default]
    Memory,
    Local {
        path: PathBuf,
    },
    S3 {
        bucket: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        access_key_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secret_access_key: Option<String>,
        /// Allow plain-http endpoints (local MinIO and the like).
        #[serde(default)]
        allow_http: bool,
    },
}

impl StorageConfig {
    /// Build the configured backend. Credentials left unset fall back to the
    /// usual AWS environment variables.
    pub fn build(&self) -> Result<Arc<dyn ObjectStore>, StorageError> {
        match self {
            StorageConfig::Memory => Ok(Arc::new(InMemory::new())),
            StorageConfig::Local { path } => {
                std::fs::create_dir_all(path).map_err(|e| {
                    StorageError::Config(format!(
                        "cannot create local store root {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let store = LocalFileSystem::new_with_prefix(path)?;
                Ok(Arc::new(store))
            }
            StorageConfig::S3 {
                bucket,
                region,
                endpoint,
                access_key_id,
                secret_access_key,
                allow_http,
            } => {
                let mut builder = AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .with_allow_http(*allow_http);
                if let Some(region) = region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                if let Some(access_key_id) = access_key_id {
                    builder = builder.with_access_key_id(access_key_id);
                }
                if let Some(secret_access_key) = secret_access_key {
                    builder = builder.with_secret_access_key(secret_access_key);
                }
                Ok(Arc::new(builder.build()?))
            }
        }
    }
}
