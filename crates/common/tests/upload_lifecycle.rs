//! Integration tests for the create / complete / confirm upload flow

mod common;

use ::common::catalog::UploadState;
use ::common::service::{CatalogError, CompleteUpload, NewProduct, PartReceipt};

fn new_product(name: &str, sources: Vec<::common::catalog::NewSource>) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: "test product".to_string(),
        metadata: Default::default(),
        sources,
        multipart_batch_size: Some(4),
    }
}

#[tokio::test]
async fn test_create_issues_one_url_per_part() {
    let catalog = common::setup_catalog();
    let small = b"abc";
    let large = b"0123456789"; // 3 parts at batch size 4

    let created = catalog
        .create_product(
            &common::alice(),
            new_product(
                "act/maps/cmb",
                vec![common::declared("small.fits", small), common::declared("large.h5", large)],
            ),
        )
        .await
        .unwrap();

    assert_eq!(created.product.state, UploadState::Transferring);
    assert_eq!(created.product.version.to_string(), "1.0.0");
    assert!(created.product.current);

    let small_src = created.product.source("small.fits").unwrap();
    assert!(!small_src.multipart);
    assert_eq!(created.upload_urls["small.fits"].len(), 1);

    let large_src = created.product.source("large.h5").unwrap();
    assert!(large_src.multipart);
    assert_eq!(large_src.number_of_parts, 3);
    assert!(large_src.upload_id.is_some());
    assert_eq!(created.upload_urls["large.h5"].len(), 3);
}

#[tokio::test]
async fn test_create_without_sources_is_immediately_available() {
    let catalog = common::setup_catalog();
    let created = catalog
        .create_product(&common::alice(), new_product("act/catalogs/empty", vec![]))
        .await
        .unwrap();
    assert_eq!(created.product.state, UploadState::Available);
    assert!(created.upload_urls.is_empty());
}

#[tokio::test]
async fn test_duplicate_current_name_rejected() {
    let catalog = common::setup_catalog();
    catalog
        .create_product(&common::alice(), new_product("act/maps/cmb", vec![]))
        .await
        .unwrap();
    let err = catalog
        .create_product(&common::alice(), new_product("act/maps/cmb", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateName(_)));
}

#[tokio::test]
async fn test_complete_rejects_missing_receipts() {
    let catalog = common::setup_catalog();
    let created = catalog
        .create_product(
            &common::alice(),
            new_product("p", vec![common::declared("data.bin", b"bytes")]),
        )
        .await
        .unwrap();

    let err = catalog
        .complete_product(&common::alice(), created.product.id, CompleteUpload::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::SourcesNotReady(_)));

    // no state change on failure
    let read = catalog.read_product(&common::alice(), created.product.id).await.unwrap();
    assert_eq!(read.state, UploadState::Transferring);
}

#[tokio::test]
async fn test_complete_rejects_wrong_part_count() {
    let catalog = common::setup_catalog();
    let body = b"0123456789"; // 3 parts at batch size 4
    let created = catalog
        .create_product(&common::alice(), new_product("p", vec![common::declared("large.h5", body)]))
        .await
        .unwrap();

    let mut upload = common::transfer(&catalog, &created, &[("large.h5", body)]).await;
    upload.receipts.get_mut("large.h5").unwrap().pop();

    let err = catalog
        .complete_product(&common::alice(), created.product.id, upload)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::SourcesNotReady(_)));
}

#[tokio::test]
async fn test_complete_rejects_wrong_size_sum() {
    let catalog = common::setup_catalog();
    let body = b"0123456789";
    let created = catalog
        .create_product(&common::alice(), new_product("p", vec![common::declared("large.h5", body)]))
        .await
        .unwrap();

    let mut upload = common::transfer(&catalog, &created, &[("large.h5", body)]).await;
    upload.receipts.get_mut("large.h5").unwrap()[0] = PartReceipt { size: 3, etag: None };

    let err = catalog
        .complete_product(&common::alice(), created.product.id, upload)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::SourcesNotReady(_)));
}

#[tokio::test]
async fn test_full_flow_to_available() {
    let catalog = common::setup_catalog();
    let small = b"abc";
    let large = b"0123456789abcdef"; // 4 parts at batch size 4
    let created = catalog
        .create_product(
            &common::alice(),
            new_product(
                "act/maps/cmb",
                vec![common::declared("small.fits", small), common::declared("large.h5", large)],
            ),
        )
        .await
        .unwrap();
    let id = created.product.id;

    let upload = common::transfer(
        &catalog,
        &created,
        &[("small.fits", small), ("large.h5", large)],
    )
    .await;
    let completed = catalog.complete_product(&common::alice(), id, upload).await.unwrap();
    assert_eq!(completed.state, UploadState::Completed);
    assert!(completed.source("large.h5").unwrap().multipart_closed);

    // the composed object is really there
    let large_src = completed.source("large.h5").unwrap();
    let stored = catalog
        .storage()
        .get(&large_src.bucket, &large_src.key)
        .await
        .unwrap();
    assert_eq!(&stored[..], large);

    let confirmed = catalog.confirm_product(&common::alice(), id).await.unwrap();
    assert_eq!(confirmed.state, UploadState::Available);
    assert!(confirmed.all_sources_available());
}

#[tokio::test]
async fn test_confirm_before_complete_fails() {
    let catalog = common::setup_catalog();
    let created = catalog
        .create_product(&common::alice(), new_product("p", vec![common::declared("d.bin", b"xy")]))
        .await
        .unwrap();

    let err = catalog
        .confirm_product(&common::alice(), created.product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::SourcesNotReady(_)));
}

#[tokio::test]
async fn test_confirm_detects_missing_object() {
    let catalog = common::setup_catalog();
    let body = b"never actually uploaded";
    let created = catalog
        .create_product(&common::alice(), new_product("p", vec![common::declared("d.bin", body)]))
        .await
        .unwrap();
    let id = created.product.id;

    // the client lies: receipts match the declaration but nothing was stored
    let mut upload = CompleteUpload::default();
    upload.receipts.insert(
        "d.bin".to_string(),
        vec![PartReceipt { size: body.len() as u64, etag: None }],
    );
    catalog.complete_product(&common::alice(), id, upload).await.unwrap();

    let err = catalog.confirm_product(&common::alice(), id).await.unwrap_err();
    assert!(matches!(err, CatalogError::SourcesNotReady(_)));

    // failed confirm leaves the node at Completed for a retry
    let read = catalog.read_product(&common::alice(), id).await.unwrap();
    assert_eq!(read.state, UploadState::Completed);
}

#[tokio::test]
async fn test_confirm_detects_corrupt_object() {
    let catalog = common::setup_catalog();
    let body = b"good-bytes-here!";
    let created = catalog
        .create_product(&common::alice(), new_product("p", vec![common::declared("d.bin", body)]))
        .await
        .unwrap();
    let id = created.product.id;
    let source = created.product.source("d.bin").unwrap().clone();

    // same length, different bytes; complete cannot tell, confirm can
    catalog
        .storage()
        .put(
            &source.bucket,
            &source.key,
            bytes::Bytes::from_static(b"evil-bytes-here!"),
        )
        .await
        .unwrap();
    let mut upload = CompleteUpload::default();
    upload.receipts.insert(
        "d.bin".to_string(),
        vec![PartReceipt { size: body.len() as u64, etag: None }],
    );
    catalog.complete_product(&common::alice(), id, upload).await.unwrap();

    let err = catalog.confirm_product(&common::alice(), id).await.unwrap_err();
    assert!(matches!(err, CatalogError::SourcesNotReady(_)));
}

#[tokio::test]
async fn test_complete_and_confirm_are_idempotent() {
    let catalog = common::setup_catalog();
    let body = b"0123456789"; // multipart
    let created = catalog
        .create_product(&common::alice(), new_product("p", vec![common::declared("d.h5", body)]))
        .await
        .unwrap();
    let id = created.product.id;

    let upload = common::transfer(&catalog, &created, &[("d.h5", body)]).await;
    catalog
        .complete_product(&common::alice(), id, upload.clone())
        .await
        .unwrap();
    // second complete finds the staging gone and the object in place
    let again = catalog.complete_product(&common::alice(), id, upload).await.unwrap();
    assert_eq!(again.state, UploadState::Completed);

    catalog.confirm_product(&common::alice(), id).await.unwrap();
    let again = catalog.confirm_product(&common::alice(), id).await.unwrap();
    assert_eq!(again.state, UploadState::Available);
    assert!(again.all_sources_available());
}
