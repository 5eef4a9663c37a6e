use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::Collection;

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::Error;
use crate::ServiceState;

/// `GET /api/v0/collection/search/:text`: substring match over
/// collection names, sorted by name.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct SearchRequest {
    /// Text to look for in collection names
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub collections: Vec<Collection>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Path(text): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let collections = state.catalog().search_collections(&who, &text).await?;
    Ok((http::StatusCode::OK, Json(SearchResponse { collections })).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for SearchRequest {
    type Response = SearchResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!("/api/v0/collection/search/{}", self.text))
            .unwrap();
        client.get(full_url)
    }
}
