//! Shared fixtures: a live API + gateway server pair per test
#![allow(dead_code)]

use tokio::net::TcpListener;
use url::Url;

use common::catalog::NewSource;
use common::checksum::Checksum;
use common::prelude::Grants;
use common::service::PartReceipt;
use granary_server::http_server::api::client::ApiClient;
use granary_server::{http_server, ServiceConfig, ServiceState};

pub const ROOT_TOKEN: &str = "tok-root";
pub const ADA_TOKEN: &str = "tok-ada";
pub const RITA_TOKEN: &str = "tok-rita";
pub const EVE_TOKEN: &str = "tok-eve";

pub const SIGNING_SECRET: &str = "test-secret";

/// Both halves of a running catalog server, bound to ephemeral ports and
/// backed by in-memory catalog and storage.
pub struct TestService {
    pub api: Url,
    pub gateway: Url,
}

impl TestService {
    pub fn client(&self, token: &str) -> ApiClient {
        ApiClient::new(&self.api, Some(token)).unwrap()
    }

    pub fn anonymous_client(&self) -> ApiClient {
        ApiClient::new(&self.api, None).unwrap()
    }
}

/// Token table: root is an admin, ada and rita sit in the fully granted
/// `users` group, eve's group holds no grants at all.
pub fn base_config() -> ServiceConfig {
    let raw = r#"
        signing_secret = "test-secret"
        open_directory = true

        [[tokens]]
        token = "tok-root"
        user = "root"
        groups = ["admin"]

        [[tokens]]
        token = "tok-ada"
        user = "ada"
        groups = ["users"]

        [[tokens]]
        token = "tok-rita"
        user = "rita"
        groups = ["users"]

        [[tokens]]
        token = "tok-eve"
        user = "eve"
        groups = ["guests"]
    "#;
    let mut config: ServiceConfig = toml::from_str(raw).unwrap();
    config.grants = Grants::permissive();
    config
}

pub async fn start() -> TestService {
    start_with(base_config()).await
}

/// Both listeners are bound before the state is built so the signed
/// transfer URLs the catalog mints point at the live gateway port.
pub async fn start_with(mut config: ServiceConfig) -> TestService {
    let api_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let gateway_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let api_addr = api_listener.local_addr().unwrap();
    let gateway_addr = gateway_listener.local_addr().unwrap();

    let api = Url::parse(&format!("http://{}", api_addr)).unwrap();
    let gateway = Url::parse(&format!("http://{}", gateway_addr)).unwrap();
    config.public_url = Some(gateway.clone());

    let state = ServiceState::from_config(&config).await.unwrap();

    let http = http_server::Config::new(api_addr, tracing::Level::DEBUG);
    let router = http_server::api_router(&http, state.clone());
    tokio::spawn(async move {
        axum::serve(api_listener, router).await.unwrap();
    });

    let http = http_server::Config::new(gateway_addr, tracing::Level::DEBUG);
    let router = http_server::gateway_router(&http, state);
    tokio::spawn(async move {
        axum::serve(gateway_listener, router).await.unwrap();
    });

    TestService { api, gateway }
}

/// Declare a source for the given bytes.
pub fn declared(name: &str, bytes: &[u8]) -> NewSource {
    NewSource {
        name: name.to_string(),
        size: bytes.len() as u64,
        checksum: Checksum::sha256_of(bytes),
    }
}

/// Push one source's bytes through its signed upload URLs, one PUT per
/// part, and collect the receipts the catalog expects back.
pub async fn push_source(urls: &[Url], bytes: &[u8], batch: Option<u64>) -> Vec<PartReceipt> {
    let http = reqwest::Client::new();
    let batch = batch.unwrap_or(bytes.len().max(1) as u64) as usize;
    let mut receipts = Vec::new();
    for (index, url) in urls.iter().enumerate() {
        let start = index * batch;
        let end = ((index + 1) * batch).min(bytes.len());
        let chunk = bytes[start..end].to_vec();
        let response = http.put(url.clone()).body(chunk).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        receipts.push(PartReceipt {
            size: (end - start) as u64,
            etag: None,
        });
    }
    receipts
}
