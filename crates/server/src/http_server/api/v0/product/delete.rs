use axum::extract::{Json, Path, Query, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::{parse_id, Error};
use crate::ServiceState;

/// `DELETE /api/v0/product/:id?data=`: delete one version node. With
/// `data=true` the stored bytes go too; otherwise only the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub id: Uuid,
    pub data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: usize,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub data: bool,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<impl IntoResponse, Error> {
    let id = parse_id(&id)?;
    state.catalog().delete_product(&who, id, params.data).await?;
    Ok((http::StatusCode::OK, Json(DeleteResponse { deleted: 1 })).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for DeleteRequest {
    type Response = DeleteResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!("/api/v0/product/{}", self.id))
            .unwrap();
        client.delete(full_url).query(&[("data", self.data)])
    }
}
