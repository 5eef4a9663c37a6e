use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::prelude::Product;

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::{parse_id, Error};
use crate::ServiceState;

/// `GET /api/v0/product/:id/tree`: the node's whole version chain,
/// oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeRequest {
    pub id: Uuid,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let id = parse_id(&id)?;
    let chain = state.catalog().walk_history(&who, id).await?;
    Ok((http::StatusCode::OK, Json(chain)).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for TreeRequest {
    type Response = Vec<Product>;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!("/api/v0/product/{}/tree", self.id))
            .unwrap();
        client.get(full_url)
    }
}
