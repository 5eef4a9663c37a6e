//! Catalog services: every operation the API exposes.
//!
//! [`Catalog`] ties together the store, object storage, URL signing, and
//! access control. Handlers and the CLI stay thin; the semantics live
//! here so the same code path serves HTTP, tests, and any embedded use.

mod collection;
mod product;

pub use collection::{CollectionUpdate, CollectionView, NewCollection};
pub use product::{
    CompleteUpload, NewProduct, PartReceipt, ProductCreated, ProductUpdate, SourceLink,
};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use url::Url;
use uuid::Uuid;

use storage::{Storage, StorageError, UrlSigner};

use crate::access::{
    ensure_privilege, AccessError, Grants, Principal, PrincipalDirectory, Privilege, ReadPolicy,
};
use crate::catalog::{Collection, Product, SourceFile};
use crate::store::{CatalogStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("name already in use: {0}")]
    DuplicateName(String),

    #[error("conflicting update: {0}")]
    Conflict(String),

    #[error(transparent)]
    Forbidden(#[from] AccessError),

    #[error("unknown owner: {0}")]
    UnknownOwner(String),

    #[error("sources not ready: {0}")]
    SourcesNotReady(String),

    #[error("collection {0} still has members")]
    CollectionNotEmpty(Uuid),

    #[error("version chain inconsistent: {0}")]
    Inconsistent(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<StoreError> for CatalogError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => CatalogError::NotFound(what),
            StoreError::DuplicateName(name) => CatalogError::DuplicateName(name),
            StoreError::CurrentMoved(id) => {
                CatalogError::Conflict(format!("product {} was replaced concurrently", id))
            }
            other => CatalogError::Store(other),
        }
    }
}

/// Tunables that vary per deployment.
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Logical bucket new sources are written under.
    pub bucket: String,
    /// Lifetime of pre-signed transfer URLs.
    pub presign_ttl: Duration,
    pub read_policy: ReadPolicy,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            bucket: "granary".to_string(),
            presign_ttl: Duration::hours(1),
            read_policy: ReadPolicy::default(),
        }
    }
}

/// The assembled catalog service.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    storage: Storage,
    signer: UrlSigner,
    directory: Arc<dyn PrincipalDirectory>,
    grants: Grants,
    options: CatalogOptions,
}

impl Catalog {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        storage: Storage,
        signer: UrlSigner,
        directory: Arc<dyn PrincipalDirectory>,
        grants: Grants,
        options: CatalogOptions,
    ) -> Self {
        Self {
            store,
            storage,
            signer,
            directory,
            grants,
            options,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    pub(crate) fn read_policy(&self) -> ReadPolicy {
        self.options.read_policy
    }

    pub(crate) fn guard(
        &self,
        principal: &Principal,
        privilege: Privilege,
    ) -> Result<(), CatalogError> {
        ensure_privilege(&self.grants, principal, privilege).map_err(Into::into)
    }

    pub(crate) async fn product(&self, id: Uuid) -> Result<Product, CatalogError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("product {}", id)))
    }

    pub(crate) async fn collection(&self, id: Uuid) -> Result<Collection, CatalogError> {
        self.store
            .get_collection(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("collection {}", id)))
    }

    pub(crate) fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    pub(crate) fn directory(&self) -> &dyn PrincipalDirectory {
        self.directory.as_ref()
    }

    pub(crate) fn bucket(&self) -> &str {
        &self.options.bucket
    }

    pub(crate) fn expires(&self) -> DateTime<Utc> {
        Utc::now() + self.options.presign_ttl
    }

    /// One signed write URL per transfer part, keyed by source name.
    pub(crate) fn upload_urls_for<'a>(
        &self,
        sources: impl Iterator<Item = &'a SourceFile>,
    ) -> Result<BTreeMap<String, Vec<Url>>, CatalogError> {
        let expires = self.expires();
        let mut urls = BTreeMap::new();
        for source in sources {
            let mut set = Vec::with_capacity(source.number_of_parts as usize);
            if source.multipart {
                for part in 1..=source.number_of_parts {
                    set.push(self.signer.sign_put(
                        &source.bucket,
                        &source.key,
                        expires,
                        Some(part),
                        source.upload_id.as_deref(),
                    )?);
                }
            } else {
                set.push(
                    self.signer
                        .sign_put(&source.bucket, &source.key, expires, None, None)?,
                );
            }
            urls.insert(source.name.clone(), set);
        }
        Ok(urls)
    }

    /// Resolve a node forward to its chain's current node without any
    /// authorization checks. Callers authorize what they return.
    pub(crate) async fn resolve_forward(&self, mut node: Product) -> Result<Product, CatalogError> {
        let start = node.id;
        while !node.current {
            node = self.store.replaced_by(node.id).await?.ok_or_else(|| {
                CatalogError::Inconsistent(format!(
                    "version chain of {} dead-ends at non-current node {}",
                    start, node.id
                ))
            })?;
        }
        Ok(node)
    }

    /// The full chain containing `node`, newest first. A dangling
    /// `replaces` reference ends the walk instead of failing, so chain
    /// maintenance still works on a graph with a deletion gap.
    pub(crate) async fn chain_of(&self, node: Product) -> Result<Vec<Product>, CatalogError> {
        let mut newest = node;
        while let Some(next) = self.store.replaced_by(newest.id).await? {
            newest = next;
        }
        let mut chain = vec![newest];
        while let Some(prev_id) = chain.last().and_then(|n| n.replaces) {
            match self.store.get_product(prev_id).await? {
                Some(prev) => chain.push(prev),
                None => break,
            }
        }
        Ok(chain)
    }
}

/// Apply add/remove deltas to an ACL list, preserving order and dropping
/// duplicates.
pub(crate) fn apply_deltas(base: &[String], add: &[String], remove: &[String]) -> Vec<String> {
    let mut out: Vec<String> = base
        .iter()
        .filter(|entry| !remove.contains(entry))
        .cloned()
        .collect();
    for entry in add {
        if !out.contains(entry) {
            out.push(entry.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_add_remove_and_dedupe() {
        let base = vec!["a".to_string(), "b".to_string()];
        let out = apply_deltas(
            &base,
            &["b".to_string(), "c".to_string()],
            &["a".to_string()],
        );
        assert_eq!(out, vec!["b".to_string(), "c".to_string()]);
    }
}
