//! Integration tests for the two access-control layers

mod common;

use ::common::access::{AccessError, ReadPolicy};
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
async fn test_missing_privilege_fails_first() {
    let catalog = common::setup_catalog();
    let err = catalog
        .create_product(&common::stranger(), bare("p"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Forbidden(AccessError::MissingPrivilege { .. })
    ));
}

#[tokio::test]
async fn test_world_policy_reads_are_open() {
    let catalog = common::setup_catalog();
    let p = catalog.create_product(&common::alice(), bare("p")).await.unwrap();
    // bob holds the read privilege and the policy is world-readable
    catalog.read_product(&common::bob(), p.product.id).await.unwrap();
}

#[tokio::test]
async fn test_acl_policy_hides_products() {
    let catalog = common::setup_catalog_with_policy(ReadPolicy::Acl);
    let p = catalog.create_product(&common::alice(), bare("p")).await.unwrap();

    let err = catalog.read_product(&common::bob(), p.product.id).await.unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Forbidden(AccessError::Denied { .. })
    ));

    // search silently filters rather than failing
    let hits = catalog.search_products(&common::bob(), "p").await.unwrap();
    assert!(hits.is_empty());

    // the owner grants bob read access on the next version
    let v2 = catalog
        .update_product(
            &common::alice(),
            p.product.id,
            ProductUpdate {
                add_readers: vec!["bob".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    catalog.read_product(&common::bob(), v2.product.id).await.unwrap();
}

#[tokio::test]
async fn test_update_requires_writer() {
    let catalog = common::setup_catalog();
    let p = catalog.create_product(&common::alice(), bare("p")).await.unwrap();

    let err = catalog
        .update_product(&common::bob(), p.product.id, ProductUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Forbidden(AccessError::Denied { .. })
    ));

    let v2 = catalog
        .update_product(
            &common::alice(),
            p.product.id,
            ProductUpdate {
                add_writers: vec!["bob".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    catalog
        .update_product(&common::bob(), v2.product.id, ProductUpdate::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_acl_changes_require_owner() {
    let catalog = common::setup_catalog();
    let p = catalog.create_product(&common::alice(), bare("p")).await.unwrap();
    let v2 = catalog
        .update_product(
            &common::alice(),
            p.product.id,
            ProductUpdate {
                add_writers: vec!["bob".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // bob may write content but not rewrite the ACL
    let err = catalog
        .update_product(
            &common::bob(),
            v2.product.id,
            ProductUpdate {
                add_readers: vec!["carol".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Forbidden(_)));
}

#[tokio::test]
async fn test_delete_requires_owner_and_admin_bypasses() {
    let catalog = common::setup_catalog();
    let p = catalog.create_product(&common::alice(), bare("p")).await.unwrap();

    let err = catalog
        .delete_product(&common::bob(), p.product.id, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Forbidden(AccessError::Denied { .. })
    ));

    catalog
        .delete_product(&common::admin(), p.product.id, false)
        .await
        .unwrap();
}
