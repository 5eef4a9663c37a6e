use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::service::SourceLink;

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::{parse_id, Error};
use crate::ServiceState;

/// `GET /api/v0/product/:id/files`: the node's sources with signed read
/// URLs, usable until the presign TTL runs out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesRequest {
    pub id: Uuid,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let id = parse_id(&id)?;
    let files = state.catalog().product_files(&who, id).await?;
    Ok((http::StatusCode::OK, Json(files)).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for FilesRequest {
    type Response = Vec<SourceLink>;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!("/api/v0/product/{}/files", self.id))
            .unwrap();
        client.get(full_url)
    }
}
