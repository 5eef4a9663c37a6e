use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::Product;

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::Error;
use crate::ServiceState;

/// `GET /api/v0/product/search/:text`: case-insensitive substring match
/// over current product names, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct SearchRequest {
    /// Text to look for in product names
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub products: Vec<Product>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Path(text): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let products = state.catalog().search_products(&who, &text).await?;
    Ok((http::StatusCode::OK, Json(SearchResponse { products })).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for SearchRequest {
    type Response = SearchResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!("/api/v0/product/search/{}", self.text))
            .unwrap();
        client.get(full_url)
    }
}
