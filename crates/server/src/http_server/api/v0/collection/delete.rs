use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::{parse_id, Error};
use crate::ServiceState;

/// `DELETE /api/v0/collection/:id`. Refused (409) while the collection
/// still has members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: Uuid,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let id = parse_id(&id)?;
    state.catalog().delete_collection(&who, id).await?;
    Ok((http::StatusCode::OK, Json(DeleteResponse { id })).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for DeleteRequest {
    type Response = DeleteResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!("/api/v0/collection/{}", self.id))
            .unwrap();
        client.delete(full_url)
    }
}
