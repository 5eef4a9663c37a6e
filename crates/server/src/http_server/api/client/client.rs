use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use url::Url;
use uuid::Uuid;

use super::error::ApiError;
use super::ApiRequest;
use crate::http_server::api::v0::collection::search::SearchRequest as CollectionSearch;
use crate::http_server::api::v0::product::search::SearchRequest as ProductSearch;

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    /// `token` rides along as a bearer header on every call when set.
    pub fn new(remote: &Url, token: Option<&str>) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidToken)?;
            default_headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&mut self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client);
        let response = request_builder.send().await?;

        if response.status().is_success() {
            Ok(response.json::<T::Response>().await?)
        } else {
            Err(ApiError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }

    /// Resolve a product name to the id of its chain's current node.
    /// Search matches substrings, so filter to the exact name.
    pub async fn resolve_product_name(&mut self, name: &str) -> Result<Uuid, ApiError> {
        let request = ProductSearch {
            text: name.to_string(),
        };
        let response = self.call(request).await?;

        response
            .products
            .into_iter()
            .find(|p| p.name == name)
            .map(|p| p.id)
            .ok_or_else(|| ApiError::NameNotFound {
                kind: "product",
                name: name.to_string(),
            })
    }

    /// Resolve a collection name to its id.
    pub async fn resolve_collection_name(&mut self, name: &str) -> Result<Uuid, ApiError> {
        let request = CollectionSearch {
            text: name.to_string(),
        };
        let response = self.call(request).await?;

        response
            .collections
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
            .ok_or_else(|| ApiError::NameNotFound {
                kind: "collection",
                name: name.to_string(),
            })
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}
