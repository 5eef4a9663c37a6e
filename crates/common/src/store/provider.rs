//! The persistence seam for catalog documents.
//!
//! Implementations guarantee two structural invariants so callers never
//! observe a half-written graph:
//!
//! - relationship edges are mirrored on both endpoints, and both halves
//!   change together (`link_*` / `unlink_*` / deletes);
//! - the current-flip in [`CatalogStore::insert_version`] is atomic: the
//!   old node loses `current` and the new node gains it in one step, or
//!   the call fails with [`StoreError::CurrentMoved`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::{Collection, Product};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("name already in use by a current product: {0}")]
    DuplicateName(String),

    #[error("current version moved while replacing {0}")]
    CurrentMoved(Uuid),

    #[error("store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    // -- products ---------------------------------------------------------

    /// Insert the first node of a new chain. Fails with `DuplicateName`
    /// when another current product already holds the name.
    async fn insert_product(&self, product: Product) -> Result<(), StoreError>;

    /// Insert a replacement node and atomically flip `current` off the
    /// node identified by `expect_current`. Mirrors the new node's
    /// `child_of` edges onto the parents. Fails with `CurrentMoved` when
    /// `expect_current` is no longer the current node of its chain.
    async fn insert_version(&self, product: Product, expect_current: Uuid)
        -> Result<(), StoreError>;

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    /// The current node holding `name`, if any.
    async fn current_by_name(&self, name: &str) -> Result<Option<Product>, StoreError>;

    /// The node that replaces `id`, if any.
    async fn replaced_by(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    /// Persist mutable per-node fields (state, sources, memberships,
    /// timestamps, ACL). Relationship edges and the `current` flag on the
    /// passed value are ignored: edges change only through `link`/`unlink`
    /// and deletes, `current` only through `insert_version`.
    async fn update_product(&self, product: &Product) -> Result<(), StoreError>;

    /// Remove a node and strip its half of every relationship edge from
    /// the surviving peers. `replaces` pointers of other nodes are left
    /// alone.
    async fn delete_product(&self, id: Uuid) -> Result<(), StoreError>;

    /// Case-insensitive substring search over current product names,
    /// most recently updated first.
    async fn search_products(&self, text: &str) -> Result<Vec<Product>, StoreError>;

    async fn link_child(&self, parent: Uuid, child: Uuid) -> Result<(), StoreError>;

    /// Fails with `NotFound` when the edge does not exist.
    async fn unlink_child(&self, parent: Uuid, child: Uuid) -> Result<(), StoreError>;

    // -- collections ------------------------------------------------------

    async fn insert_collection(&self, collection: Collection) -> Result<(), StoreError>;

    async fn get_collection(&self, id: Uuid) -> Result<Option<Collection>, StoreError>;

    async fn collection_by_name(&self, name: &str) -> Result<Option<Collection>, StoreError>;

    /// Persist mutable collection fields; nesting edges are ignored, as
    /// with products.
    async fn update_collection(&self, collection: &Collection) -> Result<(), StoreError>;

    async fn delete_collection(&self, id: Uuid) -> Result<(), StoreError>;

    async fn search_collections(&self, text: &str) -> Result<Vec<Collection>, StoreError>;

    /// Every product node tagged with a membership of this collection.
    async fn products_in_collection(&self, id: Uuid) -> Result<Vec<Product>, StoreError>;

    async fn link_collections(&self, parent: Uuid, child: Uuid) -> Result<(), StoreError>;

    async fn unlink_collections(&self, parent: Uuid, child: Uuid) -> Result<(), StoreError>;
}
