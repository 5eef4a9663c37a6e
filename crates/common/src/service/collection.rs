//! Collection operations: named groupings over product chains.
//!
//! Membership is stored on product nodes as (collection, policy) tags;
//! a collection's product set is computed here at read time. The policy
//! decides how a tag follows the chain: `Fixed` pins a node, `Current`
//! tracks the head, `New` and `All` accumulate nodes.

use std::collections::BTreeSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{ensure_owner, ensure_read, ensure_write, Principal, Privilege};
use crate::catalog::{Collection, CollectionPolicy, Membership, Product};

use super::{apply_deltas, Catalog, CatalogError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCollection {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A collection document together with its resolved product set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionView {
    pub collection: Collection,
    pub products: Vec<Product>,
}

/// In-place changes to a collection document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub add_readers: Vec<String>,
    #[serde(default)]
    pub remove_readers: Vec<String>,
    #[serde(default)]
    pub add_writers: Vec<String>,
    #[serde(default)]
    pub remove_writers: Vec<String>,
}

impl CollectionUpdate {
    fn touches_acl(&self) -> bool {
        !self.add_readers.is_empty()
            || !self.remove_readers.is_empty()
            || !self.add_writers.is_empty()
            || !self.remove_writers.is_empty()
    }
}

impl Catalog {
    pub async fn create_collection(
        &self,
        who: &Principal,
        new: NewCollection,
    ) -> Result<Collection, CatalogError> {
        self.guard(who, Privilege::CreateCollection)?;
        if new.name.trim().is_empty() {
            return Err(CatalogError::Invalid(
                "collection name cannot be empty".to_string(),
            ));
        }

        let collection = Collection {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            child_collections: Vec::new(),
            parent_collections: Vec::new(),
            owner: who.name.clone(),
            readers: Vec::new(),
            writers: Vec::new(),
        };
        self.store().insert_collection(collection.clone()).await?;
        tracing::info!(collection = %collection.id, name = %collection.name, "created collection");
        Ok(collection)
    }

    /// The collection and its product set, resolved per membership policy
    /// and filtered to what the caller may read.
    ///
    /// `Current` tags resolve through the chain at read time, so a tag
    /// stranded on a superseded node by a raced update still lands on the
    /// chain's head. A tag whose chain dead-ends is skipped, not fatal.
    pub async fn read_collection(
        &self,
        who: &Principal,
        id: Uuid,
    ) -> Result<CollectionView, CatalogError> {
        self.guard(who, Privilege::ReadCollection)?;
        let collection = self.collection(id).await?;
        ensure_read(self.read_policy(), who, &collection)?;

        let tagged = self.store().products_in_collection(id).await?;
        let mut seen: BTreeSet<Uuid> = BTreeSet::new();
        let mut products = Vec::new();
        for node in tagged {
            let Some(membership) = node.membership(id) else {
                continue;
            };
            let resolved = match membership.policy {
                CollectionPolicy::Fixed | CollectionPolicy::All | CollectionPolicy::New => node,
                CollectionPolicy::Current => {
                    if node.current {
                        node
                    } else {
                        match self.resolve_forward(node).await {
                            Ok(head) => head,
                            Err(CatalogError::Inconsistent(reason)) => {
                                tracing::warn!(collection = %id, %reason, "skipping broken chain");
                                continue;
                            }
                            Err(e) => return Err(e),
                        }
                    }
                }
            };
            if ensure_read(self.read_policy(), who, &resolved).is_err() {
                continue;
            }
            if seen.insert(resolved.id) {
                products.push(resolved);
            }
        }
        products.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| b.updated.cmp(&a.updated))
        });

        Ok(CollectionView {
            collection,
            products,
        })
    }

    /// Tag a product into the collection. `Fixed` pins exactly the given
    /// node; `New` and `Current` tag the chain's head; `All` tags every
    /// node of the chain. Re-adding with the same policy is a no-op;
    /// re-adding with a different one re-tags.
    pub async fn add_to_collection(
        &self,
        who: &Principal,
        id: Uuid,
        product_id: Uuid,
        policy: CollectionPolicy,
    ) -> Result<(), CatalogError> {
        self.guard(who, Privilege::UpdateCollection)?;
        let collection = self.collection(id).await?;
        ensure_write(who, &collection)?;
        let node = self.product(product_id).await?;
        ensure_read(self.read_policy(), who, &node)?;

        match policy {
            CollectionPolicy::Fixed => {
                self.tag_node(node, id, policy).await?;
            }
            CollectionPolicy::New | CollectionPolicy::Current => {
                let head = self.resolve_forward(node).await?;
                self.tag_node(head, id, policy).await?;
            }
            CollectionPolicy::All => {
                for chain_node in self.chain_of(node).await? {
                    self.tag_node(chain_node, id, policy).await?;
                }
            }
        }
        tracing::info!(collection = %id, product = %product_id, %policy, "added to collection");
        Ok(())
    }

    /// Strip the collection's tags from every node of the product's
    /// chain. Fails with `NotFound` when no node carried one.
    pub async fn remove_from_collection(
        &self,
        who: &Principal,
        id: Uuid,
        product_id: Uuid,
    ) -> Result<(), CatalogError> {
        self.guard(who, Privilege::UpdateCollection)?;
        let collection = self.collection(id).await?;
        ensure_write(who, &collection)?;
        let node = self.product(product_id).await?;

        let mut stripped = 0usize;
        for mut chain_node in self.chain_of(node).await? {
            let before = chain_node.collections.len();
            chain_node.collections.retain(|m| m.collection != id);
            if chain_node.collections.len() != before {
                self.store().update_product(&chain_node).await?;
                stripped += 1;
            }
        }
        if stripped == 0 {
            return Err(CatalogError::NotFound(format!(
                "product {} in collection {}",
                product_id, id
            )));
        }
        tracing::info!(collection = %id, product = %product_id, nodes = stripped, "removed from collection");
        Ok(())
    }

    pub async fn update_collection(
        &self,
        who: &Principal,
        id: Uuid,
        update: CollectionUpdate,
    ) -> Result<Collection, CatalogError> {
        self.guard(who, Privilege::UpdateCollection)?;
        let mut collection = self.collection(id).await?;
        ensure_write(who, &collection)?;
        if update.touches_acl() {
            ensure_owner(who, &collection)?;
        }

        if let Some(description) = update.description {
            collection.description = description;
        }
        collection.readers = apply_deltas(
            &collection.readers,
            &update.add_readers,
            &update.remove_readers,
        );
        collection.writers = apply_deltas(
            &collection.writers,
            &update.add_writers,
            &update.remove_writers,
        );
        self.store().update_collection(&collection).await?;
        tracing::info!(collection = %id, "updated collection");
        Ok(collection)
    }

    /// Delete an empty collection. Members must be removed first so no
    /// product is left pointing at a vanished collection.
    pub async fn delete_collection(&self, who: &Principal, id: Uuid) -> Result<(), CatalogError> {
        self.guard(who, Privilege::DeleteCollection)?;
        let collection = self.collection(id).await?;
        ensure_owner(who, &collection)?;

        if !self.store().products_in_collection(id).await?.is_empty() {
            return Err(CatalogError::CollectionNotEmpty(id));
        }
        self.store().delete_collection(id).await?;
        tracing::info!(collection = %id, "deleted collection");
        Ok(())
    }

    /// Record that `parent` groups `child`. Both halves of the nesting
    /// edge are stored.
    pub async fn add_child_collection(
        &self,
        who: &Principal,
        parent: Uuid,
        child: Uuid,
    ) -> Result<(), CatalogError> {
        self.guard(who, Privilege::CreateRelationship)?;
        if parent == child {
            return Err(CatalogError::Invalid(
                "a collection cannot be its own child".to_string(),
            ));
        }
        let parent_doc = self.collection(parent).await?;
        ensure_write(who, &parent_doc)?;
        let child_doc = self.collection(child).await?;
        ensure_read(self.read_policy(), who, &child_doc)?;

        self.store().link_collections(parent, child).await?;
        tracing::info!(parent = %parent, child = %child, "linked collections");
        Ok(())
    }

    pub async fn remove_child_collection(
        &self,
        who: &Principal,
        parent: Uuid,
        child: Uuid,
    ) -> Result<(), CatalogError> {
        self.guard(who, Privilege::DeleteRelationship)?;
        let parent_doc = self.collection(parent).await?;
        ensure_write(who, &parent_doc)?;

        self.store().unlink_collections(parent, child).await?;
        tracing::info!(parent = %parent, child = %child, "unlinked collections");
        Ok(())
    }

    /// Substring search over collection names, filtered to what the
    /// caller may read.
    pub async fn search_collections(
        &self,
        who: &Principal,
        text: &str,
    ) -> Result<Vec<Collection>, CatalogError> {
        self.guard(who, Privilege::Search)?;
        let hits = self.store().search_collections(text).await?;
        Ok(hits
            .into_iter()
            .filter(|c| ensure_read(self.read_policy(), who, c).is_ok())
            .collect())
    }

    /// Set the node's tag for this collection, replacing a tag with a
    /// different policy and leaving an identical one alone.
    async fn tag_node(
        &self,
        mut node: Product,
        id: Uuid,
        policy: CollectionPolicy,
    ) -> Result<(), CatalogError> {
        if node.membership(id).map(|m| m.policy) == Some(policy) {
            return Ok(());
        }
        node.collections.retain(|m| m.collection != id);
        node.collections.push(Membership {
            collection: id,
            policy,
        });
        node.updated = Utc::now();
        self.store().update_product(&node).await?;
        Ok(())
    }
}
