//! Token resolution and access control over the HTTP surface.

mod common;

use reqwest::StatusCode;

use ::common::prelude::ReadPolicy;
use ::common::service::{NewProduct, ProductUpdate};
use granary_server::http_server::api::client::ApiError;
use granary_server::http_server::api::v0::product::create::CreateRequest;
use granary_server::http_server::api::v0::product::get::GetRequest;
use granary_server::http_server::api::v0::product::search::SearchRequest;
use granary_server::http_server::api::v0::product::update::UpdateRequest;
use granary_server::service_config::PrincipalConfig;

fn sourceless(name: &str) -> CreateRequest {
    CreateRequest(NewProduct {
        name: name.to_string(),
        description: String::new(),
        metadata: Default::default(),
        sources: vec![],
        multipart_batch_size: None,
    })
}

fn status_of(err: ApiError) -> StatusCode {
    match err {
        ApiError::HttpStatus(status, _) => status,
        other => panic!("expected an HTTP status error, got: {}", other),
    }
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let service = common::start().await;
    let mut client = service.anonymous_client();

    let err = client
        .call(SearchRequest {
            text: "anything".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let service = common::start().await;
    let mut client = service.client("tok-forged");

    let err = client
        .call(SearchRequest {
            text: "anything".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ungranted_group_is_forbidden() {
    let service = common::start().await;
    let mut eve = service.client(common::EVE_TOKEN);

    // eve's token resolves but her group holds no privileges
    let err = eve.call(sourceless("act/maps/evil")).await.unwrap_err();
    assert_eq!(status_of(err), StatusCode::FORBIDDEN);

    let err = eve
        .call(SearchRequest {
            text: "act".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_anonymous_principal_when_configured() {
    let mut config = common::base_config();
    config.anonymous = Some(PrincipalConfig {
        user: "guest".to_string(),
        groups: vec!["users".to_string()],
    });
    let service = common::start_with(config).await;

    let mut ada = service.client(common::ADA_TOKEN);
    ada.call(sourceless("act/maps/public")).await.unwrap();

    let mut guest = service.anonymous_client();
    let hits = guest
        .call(SearchRequest {
            text: "public".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(hits.products.len(), 1);
}

#[tokio::test]
async fn test_acl_read_policy_hides_foreign_products() {
    let mut config = common::base_config();
    config.read_policy = ReadPolicy::Acl;
    let service = common::start_with(config).await;

    let mut ada = service.client(common::ADA_TOKEN);
    let id = ada
        .call(sourceless("act/maps/private"))
        .await
        .unwrap()
        .product
        .id;

    // rita holds the read privilege but sits on no ACL of this product
    let mut rita = service.client(common::RITA_TOKEN);
    let err = rita.call(GetRequest { id }).await.unwrap_err();
    assert_eq!(status_of(err), StatusCode::FORBIDDEN);
    let hits = rita
        .call(SearchRequest {
            text: "private".to_string(),
        })
        .await
        .unwrap();
    assert!(hits.products.is_empty());

    // admins bypass entity ACLs
    let mut root = service.client(common::ROOT_TOKEN);
    root.call(GetRequest { id }).await.unwrap();

    // granting rita read access takes effect on the new head
    let head = ada
        .call(UpdateRequest {
            id,
            update: ProductUpdate {
                add_readers: vec!["rita".to_string()],
                ..Default::default()
            },
        })
        .await
        .unwrap()
        .product
        .id;
    let read = rita.call(GetRequest { id: head }).await.unwrap();
    assert_eq!(read.name, "act/maps/private");
}

#[tokio::test]
async fn test_only_writers_may_update() {
    let service = common::start().await;
    let mut ada = service.client(common::ADA_TOKEN);
    let mut rita = service.client(common::RITA_TOKEN);

    let id = ada
        .call(sourceless("act/maps/guarded"))
        .await
        .unwrap()
        .product
        .id;

    // rita has the update privilege but is not a writer of this chain
    let err = rita
        .call(UpdateRequest {
            id,
            update: ProductUpdate {
                description: Some("defaced".to_string()),
                ..Default::default()
            },
        })
        .await
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::FORBIDDEN);

    let head = ada
        .call(UpdateRequest {
            id,
            update: ProductUpdate {
                add_writers: vec!["rita".to_string()],
                ..Default::default()
            },
        })
        .await
        .unwrap()
        .product
        .id;

    // as a writer rita can revise content but still not the ACLs
    let head = rita
        .call(UpdateRequest {
            id: head,
            update: ProductUpdate {
                description: Some("revised".to_string()),
                ..Default::default()
            },
        })
        .await
        .unwrap()
        .product
        .id;
    let err = rita
        .call(UpdateRequest {
            id: head,
            update: ProductUpdate {
                add_readers: vec!["eve".to_string()],
                ..Default::default()
            },
        })
        .await
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_ownership_transfer_consults_the_directory() {
    let mut config = common::base_config();
    config.open_directory = false;
    let service = common::start_with(config).await;

    let mut ada = service.client(common::ADA_TOKEN);
    let id = ada
        .call(sourceless("act/maps/handover"))
        .await
        .unwrap()
        .product
        .id;

    let err = ada
        .call(UpdateRequest {
            id,
            update: ProductUpdate {
                owner: Some("zeus".to_string()),
                ..Default::default()
            },
        })
        .await
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::NOT_ACCEPTABLE);

    // token-bearing users are always known to the directory
    let handed = ada
        .call(UpdateRequest {
            id,
            update: ProductUpdate {
                owner: Some("rita".to_string()),
                ..Default::default()
            },
        })
        .await
        .unwrap();
    assert_eq!(handed.product.owner, "rita");
}
