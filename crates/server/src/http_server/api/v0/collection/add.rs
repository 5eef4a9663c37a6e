use axum::extract::{Json, Path, Query, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::prelude::CollectionPolicy;

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::{parse_id, Error};
use crate::ServiceState;

/// `PUT /api/v0/collection/:id/product/:product_id?policy=`: tag a
/// product into the collection under the given tracking policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddRequest {
    pub collection: Uuid,
    pub product: Uuid,
    pub policy: CollectionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddResponse {
    pub collection: Uuid,
    pub product: Uuid,
    pub policy: CollectionPolicy,
}

#[derive(Debug, Deserialize)]
pub struct AddParams {
    pub policy: CollectionPolicy,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Path((id, product_id)): Path<(String, String)>,
    Query(params): Query<AddParams>,
) -> Result<impl IntoResponse, Error> {
    let collection = parse_id(&id)?;
    let product = parse_id(&product_id)?;
    state
        .catalog()
        .add_to_collection(&who, collection, product, params.policy)
        .await?;
    Ok((
        http::StatusCode::OK,
        Json(AddResponse {
            collection,
            product,
            policy: params.policy,
        }),
    )
        .into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for AddRequest {
    type Response = AddResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!(
                "/api/v0/collection/{}/product/{}",
                self.collection, self.product
            ))
            .unwrap();
        client
            .put(full_url)
            .query(&[("policy", self.policy.to_string())])
    }
}
