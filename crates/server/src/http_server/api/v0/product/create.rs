use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::service::{NewProduct, ProductCreated};

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::Error;
use crate::ServiceState;

/// Body of `PUT /api/v0/product`: the product declaration itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreateRequest(pub NewProduct);

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Json(req): Json<CreateRequest>,
) -> Result<impl IntoResponse, Error> {
    let created = state.catalog().create_product(&who, req.0).await?;
    Ok((http::StatusCode::CREATED, Json(created)).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for CreateRequest {
    type Response = ProductCreated;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/product").unwrap();
        client.put(full_url).json(&self)
    }
}
