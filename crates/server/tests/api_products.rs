//! Product API integration tests: the full HTTP loop from client to
//! catalog to gateway and back.

mod common;

use std::collections::BTreeMap;

use reqwest::StatusCode;
use uuid::Uuid;

use ::common::catalog::{Revision, UploadState};
use ::common::service::{CompleteUpload, NewProduct, PartReceipt, ProductUpdate};
use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::product::complete::CompleteRequest;
use granary_server::http_server::api::v0::product::confirm::ConfirmRequest;
use granary_server::http_server::api::v0::product::create::CreateRequest;
use granary_server::http_server::api::v0::product::delete_tree::DeleteTreeRequest;
use granary_server::http_server::api::v0::product::files::FilesRequest;
use granary_server::http_server::api::v0::product::get::GetRequest;
use granary_server::http_server::api::v0::product::search::SearchRequest;
use granary_server::http_server::api::v0::product::tree::TreeRequest;
use granary_server::http_server::api::v0::product::update::UpdateRequest;

fn new_product(name: &str, sources: Vec<::common::catalog::NewSource>) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: "test product".to_string(),
        metadata: Default::default(),
        sources,
        multipart_batch_size: Some(4),
    }
}

fn status_of(err: ApiError) -> StatusCode {
    match err {
        ApiError::HttpStatus(status, _) => status,
        other => panic!("expected an HTTP status error, got: {}", other),
    }
}

#[tokio::test]
async fn test_upload_round_trip_over_http() {
    let service = common::start().await;
    let mut client = service.client(common::ADA_TOKEN);

    let small = b"abc";
    let large = b"0123456789"; // 3 parts at batch size 4
    let created = client
        .call(CreateRequest(new_product(
            "act/maps/cmb",
            vec![
                common::declared("small.fits", small),
                common::declared("large.h5", large),
            ],
        )))
        .await
        .unwrap();
    let id = created.product.id;
    assert_eq!(created.product.state, UploadState::Transferring);
    assert_eq!(created.upload_urls["small.fits"].len(), 1);
    assert_eq!(created.upload_urls["large.h5"].len(), 3);

    // every signed URL points at the gateway this harness spun up
    for urls in created.upload_urls.values() {
        for url in urls {
            assert_eq!(url.port(), service.gateway.port());
        }
    }

    let mut receipts = BTreeMap::new();
    receipts.insert(
        "small.fits".to_string(),
        common::push_source(&created.upload_urls["small.fits"], small, None).await,
    );
    receipts.insert(
        "large.h5".to_string(),
        common::push_source(&created.upload_urls["large.h5"], large, Some(4)).await,
    );

    let completed = client
        .call(CompleteRequest {
            id,
            upload: CompleteUpload { receipts },
        })
        .await
        .unwrap();
    assert_eq!(completed.state, UploadState::Completed);

    let confirmed = client.call(ConfirmRequest { id }).await.unwrap();
    assert_eq!(confirmed.state, UploadState::Available);
    assert!(confirmed.all_sources_available());

    // read the composed multipart object back through the gateway
    let files = client.call(FilesRequest { id }).await.unwrap();
    let link = files.iter().find(|f| f.name == "large.h5").unwrap();
    assert!(link.available);
    let body = reqwest::get(link.url.clone())
        .await
        .unwrap()
        .error_for_status()
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(&body[..], large);
}

#[tokio::test]
async fn test_confirm_catches_bytes_that_never_arrived() {
    let service = common::start().await;
    let mut client = service.client(common::ADA_TOKEN);

    let body = b"xyz";
    let created = client
        .call(CreateRequest(new_product(
            "act/maps/unsent",
            vec![common::declared("data.bin", body)],
        )))
        .await
        .unwrap();
    let id = created.product.id;

    // receipts match the declaration but no PUT ever happened
    let mut receipts = BTreeMap::new();
    receipts.insert(
        "data.bin".to_string(),
        vec![PartReceipt {
            size: body.len() as u64,
            etag: None,
        }],
    );
    client
        .call(CompleteRequest {
            id,
            upload: CompleteUpload { receipts },
        })
        .await
        .unwrap();

    let err = client.call(ConfirmRequest { id }).await.unwrap_err();
    assert_eq!(status_of(err), StatusCode::FAILED_DEPENDENCY);
}

#[tokio::test]
async fn test_duplicate_current_name_conflicts() {
    let service = common::start().await;
    let mut client = service.client(common::ADA_TOKEN);

    client
        .call(CreateRequest(new_product("act/maps/dupe", vec![])))
        .await
        .unwrap();
    let err = client
        .call(CreateRequest(new_product("act/maps/dupe", vec![])))
        .await
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_malformed_id_is_a_validation_error() {
    let service = common::start().await;

    let url = service.api.join("/api/v0/product/not-a-uuid").unwrap();
    let response = reqwest::Client::new()
        .get(url)
        .header("authorization", format!("Bearer {}", common::ADA_TOKEN))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let service = common::start().await;
    let mut client = service.client(common::ADA_TOKEN);

    let err = client
        .call(GetRequest { id: Uuid::new_v4() })
        .await
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_replaces_the_current_node() {
    let service = common::start().await;
    let mut client = service.client(common::ADA_TOKEN);

    let created = client
        .call(CreateRequest(new_product("act/maps/v", vec![])))
        .await
        .unwrap();
    let first = created.product.id;

    let updated = client
        .call(UpdateRequest {
            id: first,
            update: ProductUpdate {
                description: Some("reprocessed".to_string()),
                level: Revision::Major,
                ..Default::default()
            },
        })
        .await
        .unwrap();
    let second = updated.product.id;
    assert_ne!(second, first);
    assert_eq!(updated.product.version.to_string(), "2.0.0");
    assert_eq!(updated.product.replaces, Some(first));
    assert!(updated.product.current);

    let old = client.call(GetRequest { id: first }).await.unwrap();
    assert!(!old.current);

    // history is oldest first and ends at the new head
    let chain = client.call(TreeRequest { id: first }).await.unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].id, first);
    assert_eq!(chain[1].id, second);
    assert!(chain[1].current);
}

#[tokio::test]
async fn test_update_from_stale_node_lands_on_the_head() {
    let service = common::start().await;
    let mut client = service.client(common::ADA_TOKEN);

    let created = client
        .call(CreateRequest(new_product("act/maps/stale", vec![])))
        .await
        .unwrap();
    let first = created.product.id;

    let updated = client
        .call(UpdateRequest {
            id: first,
            update: ProductUpdate::default(),
        })
        .await
        .unwrap();

    // addressing the superseded node still appends after the head
    let again = client
        .call(UpdateRequest {
            id: first,
            update: ProductUpdate::default(),
        })
        .await
        .unwrap();
    assert_eq!(again.product.replaces, Some(updated.product.id));
    assert_eq!(again.product.version.to_string(), "1.2.0");
}

#[tokio::test]
async fn test_delete_tree_reports_node_count() {
    let service = common::start().await;
    let mut client = service.client(common::ADA_TOKEN);

    let created = client
        .call(CreateRequest(new_product("act/maps/doomed", vec![])))
        .await
        .unwrap();
    let first = created.product.id;
    for _ in 0..2 {
        client
            .call(UpdateRequest {
                id: first,
                update: ProductUpdate::default(),
            })
            .await
            .unwrap();
    }

    let deleted = client
        .call(DeleteTreeRequest {
            id: first,
            data: false,
        })
        .await
        .unwrap();
    assert_eq!(deleted.deleted, 3);

    let err = client.call(GetRequest { id: first }).await.unwrap_err();
    assert_eq!(status_of(err), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_matches_current_nodes_by_substring() {
    let service = common::start().await;
    let mut client = service.client(common::ADA_TOKEN);

    client
        .call(CreateRequest(new_product("act/maps/cmb_dr6", vec![])))
        .await
        .unwrap();
    client
        .call(CreateRequest(new_product("act/catalogs/clusters", vec![])))
        .await
        .unwrap();

    let hits = client
        .call(SearchRequest {
            text: "maps".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(hits.products.len(), 1);
    assert_eq!(hits.products[0].name, "act/maps/cmb_dr6");

    let all = client
        .call(SearchRequest {
            text: "act".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(all.products.len(), 2);
}
