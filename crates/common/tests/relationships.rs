//! Integration tests for child/parent relationship edges

mod common;

use ::common::service::{CatalogError, NewProduct, ProductUpdate};

fn bare(name: &str) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: String::new(),
        metadata: Default::default(),
        sources: vec![],
        multipart_batch_size: None,
    }
}

#[tokio::test]
async fn test_link_maintains_both_mirrors() {
    let catalog = common::setup_catalog();
    let who = common::alice();
    let map = catalog.create_product(&who, bare("map")).await.unwrap();
    let tod = catalog.create_product(&who, bare("tod")).await.unwrap();

    catalog
        .add_child(&who, map.product.id, tod.product.id)
        .await
        .unwrap();

    let map_read = catalog.read_product(&who, map.product.id).await.unwrap();
    let tod_read = catalog.read_product(&who, tod.product.id).await.unwrap();
    assert!(map_read.parent_of.contains(&tod.product.id));
    assert!(tod_read.child_of.contains(&map.product.id));
}

#[tokio::test]
async fn test_unlink_removes_both_mirrors() {
    let catalog = common::setup_catalog();
    let who = common::alice();
    let map = catalog.create_product(&who, bare("map")).await.unwrap();
    let tod = catalog.create_product(&who, bare("tod")).await.unwrap();
    catalog
        .add_child(&who, map.product.id, tod.product.id)
        .await
        .unwrap();

    catalog
        .remove_child(&who, map.product.id, tod.product.id)
        .await
        .unwrap();

    let map_read = catalog.read_product(&who, map.product.id).await.unwrap();
    let tod_read = catalog.read_product(&who, tod.product.id).await.unwrap();
    assert!(map_read.parent_of.is_empty());
    assert!(tod_read.child_of.is_empty());

    // removing again reports the missing edge
    let err = catalog
        .remove_child(&who, map.product.id, tod.product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));
}

#[tokio::test]
async fn test_self_link_rejected() {
    let catalog = common::setup_catalog();
    let who = common::alice();
    let map = catalog.create_product(&who, bare("map")).await.unwrap();

    let err = catalog
        .add_child(&who, map.product.id, map.product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Invalid(_)));
}

#[tokio::test]
async fn test_deleting_one_endpoint_cleans_the_peer() {
    let catalog = common::setup_catalog();
    let who = common::alice();
    let map = catalog.create_product(&who, bare("map")).await.unwrap();
    let tod = catalog.create_product(&who, bare("tod")).await.unwrap();
    catalog
        .add_child(&who, map.product.id, tod.product.id)
        .await
        .unwrap();

    catalog
        .delete_product(&who, tod.product.id, false)
        .await
        .unwrap();

    let map_read = catalog.read_product(&who, map.product.id).await.unwrap();
    assert!(map_read.parent_of.is_empty());
}

#[tokio::test]
async fn test_update_carries_parent_edges_to_new_version() {
    let catalog = common::setup_catalog();
    let who = common::alice();
    let map = catalog.create_product(&who, bare("map")).await.unwrap();
    let tod = catalog.create_product(&who, bare("tod")).await.unwrap();
    // tod is a child of map, so map is recorded on tod's child_of
    catalog
        .add_child(&who, map.product.id, tod.product.id)
        .await
        .unwrap();

    // replacing tod keeps it attached to map, and map now points at the
    // replacement as well
    let tod2 = catalog
        .update_product(&who, tod.product.id, ProductUpdate::default())
        .await
        .unwrap();
    assert!(tod2.product.child_of.contains(&map.product.id));

    let map_read = catalog.read_product(&who, map.product.id).await.unwrap();
    assert!(map_read.parent_of.contains(&tod2.product.id));
    // the old node keeps its own edge too
    assert!(map_read.parent_of.contains(&tod.product.id));
}
