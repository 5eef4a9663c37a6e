use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::{parse_id, Error};
use crate::ServiceState;

/// `DELETE /api/v0/collection/:id/product/:product_id`: strip the
/// collection's tags from every node of the product's chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveRequest {
    pub collection: Uuid,
    pub product: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub collection: Uuid,
    pub product: Uuid,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Path((id, product_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, Error> {
    let collection = parse_id(&id)?;
    let product = parse_id(&product_id)?;
    state
        .catalog()
        .remove_from_collection(&who, collection, product)
        .await?;
    Ok((
        http::StatusCode::OK,
        Json(RemoveResponse {
            collection,
            product,
        }),
    )
        .into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for RemoveRequest {
    type Response = RemoveResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!(
                "/api/v0/collection/{}/product/{}",
                self.collection, self.product
            ))
            .unwrap();
        client.delete(full_url)
    }
}
