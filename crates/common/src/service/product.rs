//! Product operations: the versioned half of the catalog.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use storage::{Storage, StorageError};

use crate::access::{ensure_owner, ensure_read, ensure_write, Principal, Privilege};
use crate::catalog::{
    CollectionPolicy, Metadata, NewSource, Product, Revision, SourceFile, UploadState,
    VersionLabel,
};
use crate::checksum::Checksum;

use super::{apply_deltas, Catalog, CatalogError};

/// Everything needed to open a new product chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub sources: Vec<NewSource>,
    /// Split sources larger than this into multipart transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multipart_batch_size: Option<u64>,
}

/// A created or replaced node plus the write URLs for its fresh sources,
/// one URL per transfer part, keyed by source name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product: Product,
    #[serde(default)]
    pub upload_urls: BTreeMap<String, Vec<Url>>,
}

/// What the client observed while transferring one part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartReceipt {
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// Client-side record of a finished transfer, one receipt per part in
/// part order, keyed by source name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteUpload {
    #[serde(default)]
    pub receipts: BTreeMap<String, Vec<PartReceipt>>,
}

/// A source of a product, served with a signed read URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceLink {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub checksum: Checksum,
    pub available: bool,
    pub url: Url,
}

/// Changes to fold into a replacement node. Unset fields carry over from
/// the node being replaced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Sources added by this version.
    #[serde(default)]
    pub new_sources: Vec<NewSource>,
    /// Sources re-declared with fresh bytes; must name existing sources.
    #[serde(default)]
    pub replace_sources: Vec<NewSource>,
    /// Sources the new version no longer carries.
    #[serde(default)]
    pub drop_sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multipart_batch_size: Option<u64>,
    /// Which version component to bump.
    #[serde(default)]
    pub level: Revision,
    #[serde(default)]
    pub add_readers: Vec<String>,
    #[serde(default)]
    pub remove_readers: Vec<String>,
    #[serde(default)]
    pub add_writers: Vec<String>,
    #[serde(default)]
    pub remove_writers: Vec<String>,
}

impl ProductUpdate {
    fn touches_acl(&self) -> bool {
        self.owner.is_some()
            || !self.add_readers.is_empty()
            || !self.remove_readers.is_empty()
            || !self.add_writers.is_empty()
            || !self.remove_writers.is_empty()
    }
}

impl Catalog {
    /// Open a new product chain: one current node, state `Transferring`
    /// while sources are outstanding, plus signed write URLs for them.
    pub async fn create_product(
        &self,
        who: &Principal,
        new: NewProduct,
    ) -> Result<ProductCreated, CatalogError> {
        self.guard(who, Privilege::CreateProduct)?;
        validate_name(&new.name)?;
        validate_new_sources(new.sources.iter(), &[])?;

        let mut sources = Vec::with_capacity(new.sources.len());
        for declared in new.sources {
            sources.push(self.prepare_source(declared, who, new.multipart_batch_size));
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            metadata: new.metadata,
            uploaded: now,
            updated: now,
            current: true,
            version: VersionLabel::initial(),
            state: if sources.is_empty() {
                UploadState::Available
            } else {
                UploadState::Transferring
            },
            sources,
            replaces: None,
            child_of: Vec::new(),
            parent_of: Vec::new(),
            collections: Vec::new(),
            owner: who.name.clone(),
            readers: Vec::new(),
            writers: Vec::new(),
        };

        let upload_urls = self.upload_urls_for(product.sources.iter())?;
        self.store().insert_product(product.clone()).await?;
        tracing::info!(
            product = %product.id,
            name = %product.name,
            sources = product.sources.len(),
            "created product"
        );
        Ok(ProductCreated {
            product,
            upload_urls,
        })
    }

    /// Record that the client finished transferring: check the receipts
    /// against the declared sources, stitch multipart sessions into their
    /// final objects, and move the node to `Completed`.
    ///
    /// Safe to retry; already-composed sources are detected and skipped.
    pub async fn complete_product(
        &self,
        who: &Principal,
        id: Uuid,
        upload: CompleteUpload,
    ) -> Result<Product, CatalogError> {
        self.guard(who, Privilege::CreateProduct)?;
        let mut product = self.product(id).await?;
        ensure_write(who, &product)?;

        for source in &product.sources {
            let receipts = upload.receipts.get(&source.name).ok_or_else(|| {
                CatalogError::SourcesNotReady(format!(
                    "no transfer receipts for source {}",
                    source.name
                ))
            })?;
            if receipts.len() != source.number_of_parts as usize {
                return Err(CatalogError::SourcesNotReady(format!(
                    "source {}: {} parts transferred, {} declared",
                    source.name,
                    receipts.len(),
                    source.number_of_parts
                )));
            }
            let transferred: u64 = receipts.iter().map(|r| r.size).sum();
            if transferred != source.size {
                return Err(CatalogError::SourcesNotReady(format!(
                    "source {}: {} bytes transferred, {} declared",
                    source.name, transferred, source.size
                )));
            }
        }

        for source in &mut product.sources {
            if !source.multipart || source.multipart_closed {
                continue;
            }
            // A retry after a crashed complete finds staged parts gone but
            // the final object in place.
            if self.storage.size(&source.bucket, &source.key).await? == Some(source.size) {
                source.multipart_closed = true;
                continue;
            }
            let upload_id = source.upload_id.as_deref().ok_or_else(|| {
                CatalogError::Inconsistent(format!(
                    "source {} is multipart but has no upload session",
                    source.name
                ))
            })?;
            self.storage
                .compose(
                    &source.bucket,
                    &source.key,
                    upload_id,
                    source.number_of_parts,
                )
                .await
                .map_err(|e| match e {
                    StorageError::NotFound(path) => CatalogError::SourcesNotReady(format!(
                        "source {}: staged part missing at {}",
                        source.name, path
                    )),
                    other => other.into(),
                })?;
            source.multipart_closed = true;
        }

        if product.state < UploadState::Completed {
            product.state = UploadState::Completed;
        }
        product.updated = Utc::now();
        self.store().update_product(&product).await?;
        tracing::info!(product = %id, "upload completed");
        Ok(product)
    }

    /// Verify every source against what storage actually holds and mark
    /// the node `Available`. Verification reads the stored bytes; it does
    /// not trust the client's receipts.
    pub async fn confirm_product(&self, who: &Principal, id: Uuid) -> Result<Product, CatalogError> {
        self.guard(who, Privilege::ConfirmProduct)?;
        let mut product = self.product(id).await?;
        ensure_write(who, &product)?;

        if product.state < UploadState::Completed {
            return Err(CatalogError::SourcesNotReady(format!(
                "product {} is still {}",
                id, product.state
            )));
        }

        for source in &product.sources {
            let stat = self
                .storage
                .stat(&source.bucket, &source.key)
                .await?
                .ok_or_else(|| {
                    CatalogError::SourcesNotReady(format!(
                        "source {} missing from storage",
                        source.name
                    ))
                })?;
            if stat.size != source.size {
                return Err(CatalogError::SourcesNotReady(format!(
                    "source {}: {} bytes stored, {} declared",
                    source.name, stat.size, source.size
                )));
            }
            if !source.checksum.matches_sha256_hex(&stat.sha256) {
                return Err(CatalogError::SourcesNotReady(format!(
                    "source {}: checksum mismatch",
                    source.name
                )));
            }
        }

        for source in &mut product.sources {
            source.available = true;
        }
        product.state = UploadState::Available;
        product.updated = Utc::now();
        self.store().update_product(&product).await?;
        tracing::info!(product = %id, sources = product.sources.len(), "product available");
        Ok(product)
    }

    pub async fn read_product(&self, who: &Principal, id: Uuid) -> Result<Product, CatalogError> {
        self.guard(who, Privilege::ReadProduct)?;
        let product = self.product(id).await?;
        ensure_read(self.read_policy(), who, &product)?;
        Ok(product)
    }

    /// The current node carrying `name`.
    pub async fn read_product_by_name(
        &self,
        who: &Principal,
        name: &str,
    ) -> Result<Product, CatalogError> {
        self.guard(who, Privilege::ReadProduct)?;
        let product = self
            .store()
            .current_by_name(name)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("product {}", name)))?;
        ensure_read(self.read_policy(), who, &product)?;
        Ok(product)
    }

    /// Follow `replaces` pointers forward from any node to its chain's
    /// current node. Every hop is authorized; a chain that dead-ends
    /// before reaching a current node is reported as inconsistent.
    pub async fn walk_to_current(&self, who: &Principal, id: Uuid) -> Result<Product, CatalogError> {
        self.guard(who, Privilege::ReadProduct)?;
        let start = self.product(id).await?;
        ensure_read(self.read_policy(), who, &start)?;
        let mut node = start;
        while !node.current {
            node = self.store().replaced_by(node.id).await?.ok_or_else(|| {
                CatalogError::Inconsistent(format!(
                    "version chain of {} dead-ends at non-current node {}",
                    id, node.id
                ))
            })?;
            ensure_read(self.read_policy(), who, &node)?;
        }
        Ok(node)
    }

    /// The full chain containing `id`, oldest first. A broken back
    /// reference is reported as inconsistent rather than silently
    /// shortening the history.
    pub async fn walk_history(
        &self,
        who: &Principal,
        id: Uuid,
    ) -> Result<Vec<Product>, CatalogError> {
        let current = self.walk_to_current(who, id).await?;
        let mut chain = vec![current];
        while let Some(prev_id) = chain.last().and_then(|n| n.replaces) {
            let prev = self.store().get_product(prev_id).await?.ok_or_else(|| {
                CatalogError::Inconsistent(format!(
                    "version chain references missing node {}",
                    prev_id
                ))
            })?;
            ensure_read(self.read_policy(), who, &prev)?;
            chain.push(prev);
        }
        chain.reverse();
        Ok(chain)
    }

    /// The node's sources with signed read URLs.
    pub async fn product_files(
        &self,
        who: &Principal,
        id: Uuid,
    ) -> Result<Vec<SourceLink>, CatalogError> {
        self.guard(who, Privilege::ReadProduct)?;
        let product = self.product(id).await?;
        ensure_read(self.read_policy(), who, &product)?;

        let expires = self.expires();
        product
            .sources
            .iter()
            .map(|source| {
                Ok(SourceLink {
                    id: source.id,
                    name: source.name.clone(),
                    size: source.size,
                    checksum: source.checksum.clone(),
                    available: source.available,
                    url: self.signer.sign_get(&source.bucket, &source.key, expires)?,
                })
            })
            .collect()
    }

    /// Replace the chain's current node with a new version. The node
    /// named by `id` may sit anywhere in the chain; the update always
    /// applies at the head.
    pub async fn update_product(
        &self,
        who: &Principal,
        id: Uuid,
        update: ProductUpdate,
    ) -> Result<ProductCreated, CatalogError> {
        self.guard(who, Privilege::UpdateProduct)?;
        let node = self.product(id).await?;
        let current = self.resolve_forward(node).await?;
        ensure_write(who, &current)?;
        if update.touches_acl() {
            ensure_owner(who, &current)?;
        }

        if let Some(owner) = &update.owner {
            if !self.directory().exists(owner) {
                return Err(CatalogError::UnknownOwner(owner.clone()));
            }
        }
        if let Some(name) = &update.name {
            validate_name(name)?;
            if *name != current.name && self.store().current_by_name(name).await?.is_some() {
                return Err(CatalogError::DuplicateName(name.clone()));
            }
        }
        for dropped in &update.drop_sources {
            if current.source(dropped).is_none() {
                return Err(CatalogError::Invalid(format!(
                    "cannot drop unknown source {}",
                    dropped
                )));
            }
        }
        for replaced in &update.replace_sources {
            if current.source(&replaced.name).is_none() {
                return Err(CatalogError::Invalid(format!(
                    "cannot replace unknown source {}",
                    replaced.name
                )));
            }
        }
        let kept: Vec<&str> = current
            .sources
            .iter()
            .filter(|s| !update.drop_sources.contains(&s.name))
            .filter(|s| !update.replace_sources.iter().any(|r| r.name == s.name))
            .map(|s| s.name.as_str())
            .collect();
        validate_new_sources(
            update.replace_sources.iter().chain(update.new_sources.iter()),
            &kept,
        )?;

        // Carried sources share their object keys with the old node; only
        // fresh declarations get new keys and transfer URLs.
        let mut sources: Vec<SourceFile> = current
            .sources
            .iter()
            .filter(|s| kept.contains(&s.name.as_str()))
            .cloned()
            .collect();
        for declared in update
            .replace_sources
            .into_iter()
            .chain(update.new_sources.into_iter())
        {
            sources.push(self.prepare_source(declared, who, update.multipart_batch_size));
        }

        let state = if sources.iter().all(|s| s.available) {
            UploadState::Available
        } else {
            UploadState::Transferring
        };
        // Current tags travel to the new head; All and New tags are
        // copied so the old node keeps its own; Fixed stays behind.
        let collections = current
            .collections
            .iter()
            .filter(|m| m.policy != CollectionPolicy::Fixed)
            .copied()
            .collect();

        let now = Utc::now();
        let replacement = Product {
            id: Uuid::new_v4(),
            name: update.name.unwrap_or_else(|| current.name.clone()),
            description: update
                .description
                .unwrap_or_else(|| current.description.clone()),
            metadata: update.metadata.unwrap_or_else(|| current.metadata.clone()),
            uploaded: current.uploaded,
            updated: now,
            current: true,
            version: current.version.bump(update.level),
            state,
            sources,
            replaces: Some(current.id),
            child_of: current.child_of.clone(),
            parent_of: Vec::new(),
            collections,
            owner: update.owner.unwrap_or_else(|| current.owner.clone()),
            readers: apply_deltas(&current.readers, &update.add_readers, &update.remove_readers),
            writers: apply_deltas(&current.writers, &update.add_writers, &update.remove_writers),
        };

        let upload_urls =
            self.upload_urls_for(replacement.sources.iter().filter(|s| !s.available))?;
        self.store()
            .insert_version(replacement.clone(), current.id)
            .await?;

        // The old head hands over its moving tags. A failure here leaves
        // stale Current tags behind; collection reads resolve through the
        // chain, so the membership self-heals on the next pass.
        let mut old = current;
        old.collections
            .retain(|m| m.policy != CollectionPolicy::Current);
        self.store().update_product(&old).await?;

        tracing::info!(
            product = %replacement.id,
            replaces = %old.id,
            version = %replacement.version,
            "replaced product version"
        );
        Ok(ProductCreated {
            product: replacement,
            upload_urls,
        })
    }

    /// Record that `parent` derives from / contains `child`. Both halves
    /// of the edge are stored.
    pub async fn add_child(
        &self,
        who: &Principal,
        parent: Uuid,
        child: Uuid,
    ) -> Result<(), CatalogError> {
        self.guard(who, Privilege::CreateRelationship)?;
        if parent == child {
            return Err(CatalogError::Invalid(
                "a product cannot be its own child".to_string(),
            ));
        }
        let parent_doc = self.product(parent).await?;
        ensure_write(who, &parent_doc)?;
        let child_doc = self.product(child).await?;
        ensure_read(self.read_policy(), who, &child_doc)?;

        self.store().link_child(parent, child).await?;
        tracing::info!(parent = %parent, child = %child, "linked products");
        Ok(())
    }

    pub async fn remove_child(
        &self,
        who: &Principal,
        parent: Uuid,
        child: Uuid,
    ) -> Result<(), CatalogError> {
        self.guard(who, Privilege::DeleteRelationship)?;
        let parent_doc = self.product(parent).await?;
        ensure_write(who, &parent_doc)?;

        self.store().unlink_child(parent, child).await?;
        tracing::info!(parent = %parent, child = %child, "unlinked products");
        Ok(())
    }

    /// Delete a single version node. Deleting from the middle of a chain
    /// leaves a gap that history walks report as inconsistent; use
    /// [`Catalog::delete_product_tree`] to retire a whole chain.
    pub async fn delete_product(
        &self,
        who: &Principal,
        id: Uuid,
        purge: bool,
    ) -> Result<(), CatalogError> {
        self.guard(who, Privilege::DeleteProduct)?;
        let product = self.product(id).await?;
        ensure_owner(who, &product)?;

        if purge {
            self.purge_sources(&product).await?;
        }
        self.store().delete_product(id).await?;
        tracing::info!(product = %id, purge, "deleted product version");
        Ok(())
    }

    /// Delete every node of the chain containing `id`, newest first, so
    /// an interrupted pass never orphans a node's successor. Returns how
    /// many nodes went away.
    pub async fn delete_product_tree(
        &self,
        who: &Principal,
        id: Uuid,
        purge: bool,
    ) -> Result<usize, CatalogError> {
        self.guard(who, Privilege::DeleteProduct)?;
        let start = self.product(id).await?;
        let chain = self.chain_of(start).await?;
        for node in &chain {
            ensure_owner(who, node)?;
        }

        for node in &chain {
            if purge {
                self.purge_sources(node).await?;
            }
            self.store().delete_product(node.id).await?;
        }
        tracing::info!(product = %id, nodes = chain.len(), purge, "deleted product chain");
        Ok(chain.len())
    }

    /// Substring search over current products, filtered to what the
    /// caller may read.
    pub async fn search_products(
        &self,
        who: &Principal,
        text: &str,
    ) -> Result<Vec<Product>, CatalogError> {
        self.guard(who, Privilege::Search)?;
        let hits = self.store().search_products(text).await?;
        Ok(hits
            .into_iter()
            .filter(|p| ensure_read(self.read_policy(), who, p).is_ok())
            .collect())
    }

    fn prepare_source(
        &self,
        declared: NewSource,
        who: &Principal,
        batch_size: Option<u64>,
    ) -> SourceFile {
        let mut source = SourceFile::new(declared, &who.name, self.bucket(), batch_size);
        if source.multipart {
            source.upload_id = Some(Storage::new_upload_id());
        }
        source
    }

    /// Remove a node's bytes: the final objects and, for transfers that
    /// never composed, the staged parts.
    async fn purge_sources(&self, product: &Product) -> Result<(), CatalogError> {
        for source in &product.sources {
            if let Some(upload_id) = &source.upload_id {
                if !source.multipart_closed {
                    self.storage.abort_upload(&source.bucket, upload_id).await?;
                }
            }
            self.storage.delete(&source.bucket, &source.key).await?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::Invalid(
            "product name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Reject malformed declarations before anything is persisted: names must
/// be present and unique, also against `taken`, and checksums sha256.
fn validate_new_sources<'a>(
    sources: impl Iterator<Item = &'a NewSource>,
    taken: &[&'a str],
) -> Result<(), CatalogError> {
    let mut seen: BTreeSet<&str> = taken.iter().copied().collect();
    for source in sources {
        if source.name.trim().is_empty() {
            return Err(CatalogError::Invalid(
                "source name cannot be empty".to_string(),
            ));
        }
        if !source.checksum.is_sha256() {
            return Err(CatalogError::Invalid(format!(
                "source {}: only sha256 checksums are accepted",
                source.name
            )));
        }
        if !seen.insert(source.name.as_str()) {
            return Err(CatalogError::Invalid(format!(
                "duplicate source name {}",
                source.name
            )));
        }
    }
    Ok(())
}
