//! In-memory catalog store, used by tests and scratch servers.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::{Collection, Product};
use crate::store::provider::{CatalogStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<Uuid, Product>,
    collections: HashMap<Uuid, Collection>,
}

/// All state behind one `RwLock`, so the CAS in `insert_version` and the
/// two-sided edge updates are trivially atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("catalog lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("catalog lock poisoned".into()))
    }
}

fn push_unique(list: &mut Vec<Uuid>, id: Uuid) {
    if !list.contains(&id) {
        list.push(id);
    }
}

impl Inner {
    fn name_taken(&self, name: &str, excluding: Option<Uuid>) -> bool {
        self.products
            .values()
            .any(|p| p.current && p.name == name && Some(p.id) != excluding)
    }

    /// Write the new node's `child_of` onto the parents' `parent_of`.
    fn mirror_child_edges(&mut self, id: Uuid, child_of: &[Uuid]) {
        for parent in child_of {
            if let Some(parent) = self.products.get_mut(parent) {
                push_unique(&mut parent.parent_of, id);
            }
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.name_taken(&product.name, None) {
            return Err(StoreError::DuplicateName(product.name));
        }
        let child_of = product.child_of.clone();
        let id = product.id;
        inner.products.insert(id, product);
        inner.mirror_child_edges(id, &child_of);
        Ok(())
    }

    async fn insert_version(
        &self,
        product: Product,
        expect_current: Uuid,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        {
            let old = inner
                .products
                .get(&expect_current)
                .ok_or_else(|| StoreError::NotFound(expect_current.to_string()))?;
            if !old.current {
                return Err(StoreError::CurrentMoved(expect_current));
            }
        }
        if inner.name_taken(&product.name, Some(expect_current)) {
            return Err(StoreError::DuplicateName(product.name));
        }

        if let Some(old) = inner.products.get_mut(&expect_current) {
            old.current = false;
        }
        let child_of = product.child_of.clone();
        let id = product.id;
        inner.products.insert(id, product);
        inner.mirror_child_edges(id, &child_of);
        Ok(())
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn current_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .read()?
            .products
            .values()
            .find(|p| p.current && p.name == name)
            .cloned())
    }

    async fn replaced_by(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self
            .read()?
            .products
            .values()
            .find(|p| p.replaces == Some(id))
            .cloned())
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let entry = inner
            .products
            .get_mut(&product.id)
            .ok_or_else(|| StoreError::NotFound(product.id.to_string()))?;
        let child_of = std::mem::take(&mut entry.child_of);
        let parent_of = std::mem::take(&mut entry.parent_of);
        let current = entry.current;
        *entry = product.clone();
        entry.child_of = child_of;
        entry.parent_of = parent_of;
        entry.current = current;
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let removed = inner
            .products
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        for parent in &removed.child_of {
            if let Some(parent) = inner.products.get_mut(parent) {
                parent.parent_of.retain(|c| *c != id);
            }
        }
        for child in &removed.parent_of {
            if let Some(child) = inner.products.get_mut(child) {
                child.child_of.retain(|p| *p != id);
            }
        }
        Ok(())
    }

    async fn search_products(&self, text: &str) -> Result<Vec<Product>, StoreError> {
        let needle = text.to_lowercase();
        let mut hits: Vec<Product> = self
            .read()?
            .products
            .values()
            .filter(|p| p.current && p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.updated.cmp(&a.updated));
        Ok(hits)
    }

    async fn link_child(&self, parent: Uuid, child: Uuid) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.products.contains_key(&parent) {
            return Err(StoreError::NotFound(parent.to_string()));
        }
        if !inner.products.contains_key(&child) {
            return Err(StoreError::NotFound(child.to_string()));
        }
        if let Some(parent_doc) = inner.products.get_mut(&parent) {
            push_unique(&mut parent_doc.parent_of, child);
        }
        if let Some(child_doc) = inner.products.get_mut(&child) {
            push_unique(&mut child_doc.child_of, parent);
        }
        Ok(())
    }

    async fn unlink_child(&self, parent: Uuid, child: Uuid) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let linked = inner
            .products
            .get(&parent)
            .map(|p| p.parent_of.contains(&child))
            .unwrap_or(false);
        if !linked {
            return Err(StoreError::NotFound(format!(
                "relationship {} -> {}",
                parent, child
            )));
        }
        if let Some(parent_doc) = inner.products.get_mut(&parent) {
            parent_doc.parent_of.retain(|c| *c != child);
        }
        if let Some(child_doc) = inner.products.get_mut(&child) {
            child_doc.child_of.retain(|p| *p != parent);
        }
        Ok(())
    }

    async fn insert_collection(&self, collection: Collection) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner
            .collections
            .values()
            .any(|c| c.name == collection.name)
        {
            return Err(StoreError::DuplicateName(collection.name));
        }
        inner.collections.insert(collection.id, collection);
        Ok(())
    }

    async fn get_collection(&self, id: Uuid) -> Result<Option<Collection>, StoreError> {
        Ok(self.read()?.collections.get(&id).cloned())
    }

    async fn collection_by_name(&self, name: &str) -> Result<Option<Collection>, StoreError> {
        Ok(self
            .read()?
            .collections
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn update_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let entry = inner
            .collections
            .get_mut(&collection.id)
            .ok_or_else(|| StoreError::NotFound(collection.id.to_string()))?;
        let children = std::mem::take(&mut entry.child_collections);
        let parents = std::mem::take(&mut entry.parent_collections);
        *entry = collection.clone();
        entry.child_collections = children;
        entry.parent_collections = parents;
        Ok(())
    }

    async fn delete_collection(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let removed = inner
            .collections
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        for parent in &removed.parent_collections {
            if let Some(parent) = inner.collections.get_mut(parent) {
                parent.child_collections.retain(|c| *c != id);
            }
        }
        for child in &removed.child_collections {
            if let Some(child) = inner.collections.get_mut(child) {
                child.parent_collections.retain(|p| *p != id);
            }
        }
        Ok(())
    }

    async fn search_collections(&self, text: &str) -> Result<Vec<Collection>, StoreError> {
        let needle = text.to_lowercase();
        let mut hits: Vec<Collection> = self
            .read()?
            .collections
            .values()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(hits)
    }

    async fn products_in_collection(&self, id: Uuid) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .read()?
            .products
            .values()
            .filter(|p| p.collections.iter().any(|m| m.collection == id))
            .cloned()
            .collect())
    }

    async fn link_collections(&self, parent: Uuid, child: Uuid) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.collections.contains_key(&parent) {
            return Err(StoreError::NotFound(parent.to_string()));
        }
        if !inner.collections.contains_key(&child) {
            return Err(StoreError::NotFound(child.to_string()));
        }
        if let Some(parent_doc) = inner.collections.get_mut(&parent) {
            push_unique(&mut parent_doc.child_collections, child);
        }
        if let Some(child_doc) = inner.collections.get_mut(&child) {
            push_unique(&mut child_doc.parent_collections, parent);
        }
        Ok(())
    }

    async fn unlink_collections(&self, parent: Uuid, child: Uuid) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let linked = inner
            .collections
            .get(&parent)
            .map(|c| c.child_collections.contains(&child))
            .unwrap_or(false);
        if !linked {
            return Err(StoreError::NotFound(format!(
                "collection nesting {} -> {}",
                parent, child
            )));
        }
        if let Some(parent_doc) = inner.collections.get_mut(&parent) {
            parent_doc.child_collections.retain(|c| *c != child);
        }
        if let Some(child_doc) = inner.collections.get_mut(&child) {
            child_doc.parent_collections.retain(|p| *p != parent);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Metadata, UploadState, VersionLabel};
    use chrono::Utc;

    fn node(name: &str, current: bool) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            metadata: Metadata::default(),
            uploaded: Utc::now(),
            updated: Utc::now(),
            current,
            version: VersionLabel::initial(),
            state: UploadState::Available,
            sources: Vec::new(),
            replaces: None,
            child_of: Vec::new(),
            parent_of: Vec::new(),
            collections: Vec::new(),
            owner: "ada".into(),
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    #[tokio::test]
    async fn duplicate_current_names_are_rejected() {
        let store = MemoryCatalogStore::new();
        store.insert_product(node("maps", true)).await.unwrap();
        let err = store.insert_product(node("maps", true)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(_)));
    }

    #[tokio::test]
    async fn insert_version_flips_current_exactly_once() {
        let store = MemoryCatalogStore::new();
        let v1 = node("maps", true);
        let v1_id = v1.id;
        store.insert_product(v1).await.unwrap();

        let mut v2 = node("maps", true);
        v2.replaces = Some(v1_id);
        let v2_id = v2.id;
        store.insert_version(v2, v1_id).await.unwrap();

        assert!(!store.get_product(v1_id).await.unwrap().unwrap().current);
        assert!(store.get_product(v2_id).await.unwrap().unwrap().current);

        // a second replacement of v1 loses the race
        let mut v2b = node("maps", true);
        v2b.replaces = Some(v1_id);
        let err = store.insert_version(v2b, v1_id).await.unwrap_err();
        assert!(matches!(err, StoreError::CurrentMoved(id) if id == v1_id));
    }

    #[tokio::test]
    async fn link_and_unlink_maintain_both_mirrors() {
        let store = MemoryCatalogStore::new();
        let parent = node("parent", true);
        let child = node("child", true);
        let (pid, cid) = (parent.id, child.id);
        store.insert_product(parent).await.unwrap();
        store.insert_product(child).await.unwrap();

        store.link_child(pid, cid).await.unwrap();
        assert!(store
            .get_product(pid)
            .await
            .unwrap()
            .unwrap()
            .parent_of
            .contains(&cid));
        assert!(store
            .get_product(cid)
            .await
            .unwrap()
            .unwrap()
            .child_of
            .contains(&pid));

        store.unlink_child(pid, cid).await.unwrap();
        assert!(store
            .get_product(pid)
            .await
            .unwrap()
            .unwrap()
            .parent_of
            .is_empty());
        let err = store.unlink_child(pid, cid).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_cleans_peer_edges() {
        let store = MemoryCatalogStore::new();
        let parent = node("parent", true);
        let child = node("child", true);
        let (pid, cid) = (parent.id, child.id);
        store.insert_product(parent).await.unwrap();
        store.insert_product(child).await.unwrap();
        store.link_child(pid, cid).await.unwrap();

        store.delete_product(cid).await.unwrap();
        assert!(store
            .get_product(pid)
            .await
            .unwrap()
            .unwrap()
            .parent_of
            .is_empty());
    }

    #[tokio::test]
    async fn update_product_ignores_structural_fields() {
        let store = MemoryCatalogStore::new();
        let parent = node("parent", true);
        let child = node("child", true);
        let (pid, cid) = (parent.id, child.id);
        store.insert_product(parent).await.unwrap();
        store.insert_product(child).await.unwrap();
        store.link_child(pid, cid).await.unwrap();

        let mut doctored = store.get_product(cid).await.unwrap().unwrap();
        doctored.child_of.clear();
        doctored.current = false;
        doctored.description = "edited".into();
        store.update_product(&doctored).await.unwrap();

        let stored = store.get_product(cid).await.unwrap().unwrap();
        assert_eq!(stored.description, "edited");
        assert!(stored.child_of.contains(&pid));
        assert!(stored.current);
    }
}
