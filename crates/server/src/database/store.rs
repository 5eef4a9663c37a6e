//! Sqlite-backed [`CatalogStore`].
//!
//! Each product or collection row carries the serialized document plus the
//! columns queries filter on. Relationship edges, membership tags, and the
//! `current` flag are normalized into their own tables and overlaid onto
//! the document on read, so the structural invariants (mirrored edges, one
//! current node per chain) hold relationally and the store contract's
//! "update ignores structural fields" rule falls out for free.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use uuid::Uuid;

use common::catalog::{Collection, Membership, Product};
use common::store::{CatalogStore, StoreError};

use super::Database;

#[derive(Clone, Debug)]
pub struct SqliteCatalogStore {
    db: Database,
}

impl SqliteCatalogStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn hydrate_product(&self, row: &SqliteRow) -> Result<Product, StoreError> {
        let document: String = row.get("document");
        let current: bool = row.get("current");
        let mut product: Product = serde_json::from_str(&document)
            .map_err(|e| StoreError::Backend(format!("corrupt product document: {}", e)))?;
        product.current = current;

        let id = product.id.to_string();
        let parents = sqlx::query("SELECT parent FROM product_edges WHERE child = ?1 ORDER BY rowid")
            .bind(&id)
            .fetch_all(self.db.pool())
            .await
            .map_err(backend)?;
        product.child_of = Vec::with_capacity(parents.len());
        for row in &parents {
            let parent: String = row.get("parent");
            product.child_of.push(parse_uuid(&parent)?);
        }

        let children = sqlx::query("SELECT child FROM product_edges WHERE parent = ?1 ORDER BY rowid")
            .bind(&id)
            .fetch_all(self.db.pool())
            .await
            .map_err(backend)?;
        product.parent_of = Vec::with_capacity(children.len());
        for row in &children {
            let child: String = row.get("child");
            product.parent_of.push(parse_uuid(&child)?);
        }

        let tags =
            sqlx::query("SELECT collection, policy FROM memberships WHERE product = ?1 ORDER BY rowid")
                .bind(&id)
                .fetch_all(self.db.pool())
                .await
                .map_err(backend)?;
        product.collections = Vec::with_capacity(tags.len());
        for row in &tags {
            let collection: String = row.get("collection");
            let policy: String = row.get("policy");
            product.collections.push(Membership {
                collection: parse_uuid(&collection)?,
                policy: policy.parse().map_err(|_| {
                    StoreError::Backend(format!("unknown policy in catalog row: {}", policy))
                })?,
            });
        }

        Ok(product)
    }

    async fn hydrate_collection(&self, row: &SqliteRow) -> Result<Collection, StoreError> {
        let document: String = row.get("document");
        let mut collection: Collection = serde_json::from_str(&document)
            .map_err(|e| StoreError::Backend(format!("corrupt collection document: {}", e)))?;

        let id = collection.id.to_string();
        let children =
            sqlx::query("SELECT child FROM collection_edges WHERE parent = ?1 ORDER BY rowid")
                .bind(&id)
                .fetch_all(self.db.pool())
                .await
                .map_err(backend)?;
        collection.child_collections = Vec::with_capacity(children.len());
        for row in &children {
            let child: String = row.get("child");
            collection.child_collections.push(parse_uuid(&child)?);
        }

        let parents =
            sqlx::query("SELECT parent FROM collection_edges WHERE child = ?1 ORDER BY rowid")
                .bind(&id)
                .fetch_all(self.db.pool())
                .await
                .map_err(backend)?;
        collection.parent_collections = Vec::with_capacity(parents.len());
        for row in &parents {
            let parent: String = row.get("parent");
            collection.parent_collections.push(parse_uuid(&parent)?);
        }

        Ok(collection)
    }

    async fn fetch_product(&self, sql: &str, bind: String) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(sql)
            .bind(bind)
            .fetch_optional(self.db.pool())
            .await
            .map_err(backend)?;
        match row {
            Some(row) => Ok(Some(self.hydrate_product(&row).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        let mut tx = self.db.pool().begin().await.map_err(backend)?;
        insert_product_row(&mut tx, &product).await?;
        tx.commit().await.map_err(backend)
    }

    async fn insert_version(
        &self,
        product: Product,
        expect_current: Uuid,
    ) -> Result<(), StoreError> {
        let mut tx = self.db.pool().begin().await.map_err(backend)?;

        let flipped = sqlx::query("UPDATE products SET current = 0 WHERE id = ?1 AND current = 1")
            .bind(expect_current.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        if flipped.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM products WHERE id = ?1")
                .bind(expect_current.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;
            return Err(match exists {
                Some(_) => StoreError::CurrentMoved(expect_current),
                None => StoreError::NotFound(expect_current.to_string()),
            });
        }

        insert_product_row(&mut tx, &product).await?;
        tx.commit().await.map_err(backend)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        self.fetch_product(
            "SELECT document, current FROM products WHERE id = ?1",
            id.to_string(),
        )
        .await
    }

    async fn current_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        self.fetch_product(
            "SELECT document, current FROM products WHERE name = ?1 AND current = 1",
            name.to_string(),
        )
        .await
    }

    async fn replaced_by(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        self.fetch_product(
            "SELECT document, current FROM products WHERE replaces = ?1",
            id.to_string(),
        )
        .await
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut tx = self.db.pool().begin().await.map_err(backend)?;

        let document = encode_product(product)?;
        let updated =
            sqlx::query("UPDATE products SET name = ?2, updated_at = ?3, document = ?4 WHERE id = ?1")
                .bind(product.id.to_string())
                .bind(&product.name)
                .bind(product.updated.to_rfc3339())
                .bind(document)
                .execute(&mut *tx)
                .await
                .map_err(|e| constraint_error(e, &product.name))?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(product.id.to_string()));
        }

        // Membership tags are per-node data, not edges: replace them.
        sqlx::query("DELETE FROM memberships WHERE product = ?1")
            .bind(product.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        for membership in &product.collections {
            insert_membership_row(&mut tx, product.id, membership).await?;
        }

        tx.commit().await.map_err(backend)
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), StoreError> {
        let done = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id.to_string())
            .execute(self.db.pool())
            .await
            .map_err(backend)?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn search_products(&self, text: &str) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            "SELECT document, current FROM products \
             WHERE current = 1 AND name LIKE ?1 ORDER BY updated_at DESC",
        )
        .bind(format!("%{}%", text))
        .fetch_all(self.db.pool())
        .await
        .map_err(backend)?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            hits.push(self.hydrate_product(row).await?);
        }
        Ok(hits)
    }

    async fn link_child(&self, parent: Uuid, child: Uuid) -> Result<(), StoreError> {
        let mut tx = self.db.pool().begin().await.map_err(backend)?;
        for end in [parent, child] {
            let exists = sqlx::query("SELECT 1 FROM products WHERE id = ?1")
                .bind(end.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;
            if exists.is_none() {
                return Err(StoreError::NotFound(end.to_string()));
            }
        }
        sqlx::query("INSERT OR IGNORE INTO product_edges (parent, child) VALUES (?1, ?2)")
            .bind(parent.to_string())
            .bind(child.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        tx.commit().await.map_err(backend)
    }

    async fn unlink_child(&self, parent: Uuid, child: Uuid) -> Result<(), StoreError> {
        let done = sqlx::query("DELETE FROM product_edges WHERE parent = ?1 AND child = ?2")
            .bind(parent.to_string())
            .bind(child.to_string())
            .execute(self.db.pool())
            .await
            .map_err(backend)?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "relationship {} -> {}",
                parent, child
            )));
        }
        Ok(())
    }

    async fn insert_collection(&self, collection: Collection) -> Result<(), StoreError> {
        let mut tx = self.db.pool().begin().await.map_err(backend)?;

        let document = encode_collection(&collection)?;
        sqlx::query("INSERT INTO collections (id, name, document) VALUES (?1, ?2, ?3)")
            .bind(collection.id.to_string())
            .bind(&collection.name)
            .bind(document)
            .execute(&mut *tx)
            .await
            .map_err(|e| constraint_error(e, &collection.name))?;

        for child in &collection.child_collections {
            insert_collection_edge(&mut tx, collection.id, *child).await?;
        }
        for parent in &collection.parent_collections {
            insert_collection_edge(&mut tx, *parent, collection.id).await?;
        }

        tx.commit().await.map_err(backend)
    }

    async fn get_collection(&self, id: Uuid) -> Result<Option<Collection>, StoreError> {
        let row = sqlx::query("SELECT document FROM collections WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(self.db.pool())
            .await
            .map_err(backend)?;
        match row {
            Some(row) => Ok(Some(self.hydrate_collection(&row).await?)),
            None => Ok(None),
        }
    }

    async fn collection_by_name(&self, name: &str) -> Result<Option<Collection>, StoreError> {
        let row = sqlx::query("SELECT document FROM collections WHERE name = ?1")
            .bind(name)
            .fetch_optional(self.db.pool())
            .await
            .map_err(backend)?;
        match row {
            Some(row) => Ok(Some(self.hydrate_collection(&row).await?)),
            None => Ok(None),
        }
    }

    async fn update_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        let document = encode_collection(collection)?;
        let updated = sqlx::query("UPDATE collections SET name = ?2, document = ?3 WHERE id = ?1")
            .bind(collection.id.to_string())
            .bind(&collection.name)
            .bind(document)
            .execute(self.db.pool())
            .await
            .map_err(|e| constraint_error(e, &collection.name))?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(collection.id.to_string()));
        }
        Ok(())
    }

    async fn delete_collection(&self, id: Uuid) -> Result<(), StoreError> {
        let done = sqlx::query("DELETE FROM collections WHERE id = ?1")
            .bind(id.to_string())
            .execute(self.db.pool())
            .await
            .map_err(backend)?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn search_collections(&self, text: &str) -> Result<Vec<Collection>, StoreError> {
        let rows = sqlx::query("SELECT document FROM collections WHERE name LIKE ?1 ORDER BY name")
            .bind(format!("%{}%", text))
            .fetch_all(self.db.pool())
            .await
            .map_err(backend)?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            hits.push(self.hydrate_collection(row).await?);
        }
        Ok(hits)
    }

    async fn products_in_collection(&self, id: Uuid) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            "SELECT p.document AS document, p.current AS current FROM products p \
             JOIN memberships m ON m.product = p.id WHERE m.collection = ?1 ORDER BY p.rowid",
        )
        .bind(id.to_string())
        .fetch_all(self.db.pool())
        .await
        .map_err(backend)?;

        let mut members = Vec::with_capacity(rows.len());
        for row in &rows {
            members.push(self.hydrate_product(row).await?);
        }
        Ok(members)
    }

    async fn link_collections(&self, parent: Uuid, child: Uuid) -> Result<(), StoreError> {
        let mut tx = self.db.pool().begin().await.map_err(backend)?;
        for end in [parent, child] {
            let exists = sqlx::query("SELECT 1 FROM collections WHERE id = ?1")
                .bind(end.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;
            if exists.is_none() {
                return Err(StoreError::NotFound(end.to_string()));
            }
        }
        sqlx::query("INSERT OR IGNORE INTO collection_edges (parent, child) VALUES (?1, ?2)")
            .bind(parent.to_string())
            .bind(child.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        tx.commit().await.map_err(backend)
    }

    async fn unlink_collections(&self, parent: Uuid, child: Uuid) -> Result<(), StoreError> {
        let done = sqlx::query("DELETE FROM collection_edges WHERE parent = ?1 AND child = ?2")
            .bind(parent.to_string())
            .bind(child.to_string())
            .execute(self.db.pool())
            .await
            .map_err(backend)?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "collection nesting {} -> {}",
                parent, child
            )));
        }
        Ok(())
    }
}

async fn insert_product_row(
    tx: &mut Transaction<'_, Sqlite>,
    product: &Product,
) -> Result<(), StoreError> {
    let document = encode_product(product)?;
    sqlx::query(
        "INSERT INTO products (id, name, current, replaces, updated_at, document) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(product.id.to_string())
    .bind(&product.name)
    .bind(product.current)
    .bind(product.replaces.map(|id| id.to_string()))
    .bind(product.updated.to_rfc3339())
    .bind(document)
    .execute(&mut **tx)
    .await
    .map_err(|e| constraint_error(e, &product.name))?;

    for parent in &product.child_of {
        insert_product_edge(tx, *parent, product.id).await?;
    }
    for child in &product.parent_of {
        insert_product_edge(tx, product.id, *child).await?;
    }
    for membership in &product.collections {
        insert_membership_row(tx, product.id, membership).await?;
    }
    Ok(())
}

/// Edge insert that skips silently when either endpoint is gone, matching
/// the tolerant mirroring of the in-memory store.
async fn insert_product_edge(
    tx: &mut Transaction<'_, Sqlite>,
    parent: Uuid,
    child: Uuid,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT OR IGNORE INTO product_edges (parent, child) \
         SELECT ?1, ?2 \
         WHERE EXISTS (SELECT 1 FROM products WHERE id = ?1) \
           AND EXISTS (SELECT 1 FROM products WHERE id = ?2)",
    )
    .bind(parent.to_string())
    .bind(child.to_string())
    .execute(&mut **tx)
    .await
    .map_err(backend)?;
    Ok(())
}

async fn insert_collection_edge(
    tx: &mut Transaction<'_, Sqlite>,
    parent: Uuid,
    child: Uuid,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT OR IGNORE INTO collection_edges (parent, child) \
         SELECT ?1, ?2 \
         WHERE EXISTS (SELECT 1 FROM collections WHERE id = ?1) \
           AND EXISTS (SELECT 1 FROM collections WHERE id = ?2)",
    )
    .bind(parent.to_string())
    .bind(child.to_string())
    .execute(&mut **tx)
    .await
    .map_err(backend)?;
    Ok(())
}

async fn insert_membership_row(
    tx: &mut Transaction<'_, Sqlite>,
    product: Uuid,
    membership: &Membership,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT OR IGNORE INTO memberships (product, collection, policy) \
         SELECT ?1, ?2, ?3 \
         WHERE EXISTS (SELECT 1 FROM collections WHERE id = ?2)",
    )
    .bind(product.to_string())
    .bind(membership.collection.to_string())
    .bind(membership.policy.to_string())
    .execute(&mut **tx)
    .await
    .map_err(backend)?;
    Ok(())
}

/// The document column holds everything except the relationally-managed
/// fields, which are zeroed so a stale copy can never leak back on read.
fn encode_product(product: &Product) -> Result<String, StoreError> {
    let mut doc = product.clone();
    doc.current = false;
    doc.child_of.clear();
    doc.parent_of.clear();
    doc.collections.clear();
    serde_json::to_string(&doc)
        .map_err(|e| StoreError::Backend(format!("cannot serialize product: {}", e)))
}

fn encode_collection(collection: &Collection) -> Result<String, StoreError> {
    let mut doc = collection.clone();
    doc.child_collections.clear();
    doc.parent_collections.clear();
    serde_json::to_string(&doc)
        .map_err(|e| StoreError::Backend(format!("cannot serialize collection: {}", e)))
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn constraint_error(e: sqlx::Error, name: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::DuplicateName(name.to_string());
        }
    }
    backend(e)
}

fn parse_uuid(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw)
        .map_err(|_| StoreError::Backend(format!("corrupt uuid in catalog row: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::catalog::{CollectionPolicy, Metadata, NewSource, SourceFile, UploadState, VersionLabel};
    use common::checksum::Checksum;

    async fn store() -> SqliteCatalogStore {
        Database::memory().await.unwrap().catalog_store()
    }

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

    fn coll(name: &str) -> Collection {
        Collection {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            child_collections: Vec::new(),
            parent_collections: Vec::new(),
            owner: "ada".into(),
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    #[tokio::test]
    async fn duplicate_current_names_are_rejected() {
        let store = store().await;
        store.insert_product(node("maps", true)).await.unwrap();
        let err = store.insert_product(node("maps", true)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(_)));

        // a non-current row may reuse the name
        store.insert_product(node("maps", false)).await.unwrap();
    }

    #[tokio::test]
    async fn insert_version_flips_current_exactly_once() {
        let store = store().await;
        let v1 = node("maps", true);
        let v1_id = v1.id;
        store.insert_product(v1).await.unwrap();

        let mut v2 = node("maps", true);
        v2.replaces = Some(v1_id);
        let v2_id = v2.id;
        store.insert_version(v2, v1_id).await.unwrap();

        assert!(!store.get_product(v1_id).await.unwrap().unwrap().current);
        assert!(store.get_product(v2_id).await.unwrap().unwrap().current);
        assert_eq!(
            store.replaced_by(v1_id).await.unwrap().unwrap().id,
            v2_id
        );

        // a second replacement of v1 loses the race and rolls back
        let mut v2b = node("maps", true);
        v2b.replaces = Some(v1_id);
        let err = store.insert_version(v2b, v1_id).await.unwrap_err();
        assert!(matches!(err, StoreError::CurrentMoved(id) if id == v1_id));
        assert!(store.get_product(v2_id).await.unwrap().unwrap().current);
    }

    #[tokio::test]
    async fn link_and_unlink_maintain_both_mirrors() {
        let store = store().await;
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
    async fn delete_cleans_peer_edges_and_memberships() {
        let store = store().await;
        let parent = node("parent", true);
        let child = node("child", true);
        let (pid, cid) = (parent.id, child.id);
        store.insert_product(parent).await.unwrap();
        store.insert_product(child).await.unwrap();
        store.link_child(pid, cid).await.unwrap();

        let group = coll("group");
        let group_id = group.id;
        store.insert_collection(group).await.unwrap();
        let mut tagged = store.get_product(cid).await.unwrap().unwrap();
        tagged.collections.push(Membership {
            collection: group_id,
            policy: CollectionPolicy::Fixed,
        });
        store.update_product(&tagged).await.unwrap();
        assert_eq!(
            store.products_in_collection(group_id).await.unwrap().len(),
            1
        );

        store.delete_product(cid).await.unwrap();
        assert!(store
            .get_product(pid)
            .await
            .unwrap()
            .unwrap()
            .parent_of
            .is_empty());
        assert!(store
            .products_in_collection(group_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn update_product_ignores_structural_fields() {
        let store = store().await;
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

    #[tokio::test]
    async fn documents_round_trip_with_sources() {
        let store = store().await;
        let mut product = node("sky-survey", true);
        product.metadata = Metadata::Numeric {
            units: Some("uK".into()),
            shape: vec![2048, 2048],
        };
        product.sources.push(SourceFile::new(
            NewSource {
                name: "map.fits".into(),
                size: 1 << 22,
                checksum: Checksum::sha256_of(b"fake"),
            },
            "ada",
            "granary",
            Some(1 << 20),
        ));
        let id = product.id;
        store.insert_product(product).await.unwrap();

        let stored = store.get_product(id).await.unwrap().unwrap();
        assert_eq!(stored.sources.len(), 1);
        assert_eq!(stored.sources[0].name, "map.fits");
        assert_eq!(stored.sources[0].number_of_parts, 4);
        assert!(matches!(stored.metadata, Metadata::Numeric { .. }));

        let hit = store.current_by_name("sky-survey").await.unwrap().unwrap();
        assert_eq!(hit.id, id);
        assert_eq!(store.search_products("SKY").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn collection_nesting_mirrors() {
        let store = store().await;
        let outer = coll("outer");
        let inner = coll("inner");
        let (oid, iid) = (outer.id, inner.id);
        store.insert_collection(outer).await.unwrap();
        store.insert_collection(inner).await.unwrap();

        let err = store.insert_collection(coll("outer")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(_)));

        store.link_collections(oid, iid).await.unwrap();
        assert!(store
            .get_collection(oid)
            .await
            .unwrap()
            .unwrap()
            .child_collections
            .contains(&iid));
        assert!(store
            .get_collection(iid)
            .await
            .unwrap()
            .unwrap()
            .parent_collections
            .contains(&oid));

        store.delete_collection(iid).await.unwrap();
        assert!(store
            .get_collection(oid)
            .await
            .unwrap()
            .unwrap()
            .child_collections
            .is_empty());
    }
}
