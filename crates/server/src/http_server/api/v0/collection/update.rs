use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::prelude::Collection;
use common::service::CollectionUpdate;

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::{parse_id, Error};
use crate::ServiceState;

/// `POST /api/v0/collection/:id/update`: in-place edits; collections do
/// not version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub id: Uuid,
    pub update: CollectionUpdate,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Path(id): Path<String>,
    Json(update): Json<CollectionUpdate>,
) -> Result<impl IntoResponse, Error> {
    let id = parse_id(&id)?;
    let collection = state.catalog().update_collection(&who, id, update).await?;
    Ok((http::StatusCode::OK, Json(collection)).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for UpdateRequest {
    type Response = Collection;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!("/api/v0/collection/{}/update", self.id))
            .unwrap();
        client.post(full_url).json(&self.update)
    }
}
