use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::service::{ProductCreated, ProductUpdate};

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::{parse_id, Error};
use crate::ServiceState;

/// `POST /api/v0/product/:id/update`. The id may name any node of the
/// chain; the replacement always applies at the chain's head.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub id: Uuid,
    pub update: ProductUpdate,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Path(id): Path<String>,
    Json(update): Json<ProductUpdate>,
) -> Result<impl IntoResponse, Error> {
    let id = parse_id(&id)?;
    let created = state.catalog().update_product(&who, id, update).await?;
    Ok((http::StatusCode::CREATED, Json(created)).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for UpdateRequest {
    type Response = ProductCreated;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!("/api/v0/product/{}/update", self.id))
            .unwrap();
        client.post(full_url).json(&self.update)
    }
}
