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

/// `POST /api/v0/product/:id/confirm`: server-side verification of the
/// stored bytes. On success the node becomes `Available`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmRequest {
    pub id: Uuid,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let id = parse_id(&id)?;
    let product = state.catalog().confirm_product(&who, id).await?;
    Ok((http::StatusCode::OK, Json(product)).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for ConfirmRequest {
    type Response = Product;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!("/api/v0/product/{}/confirm", self.id))
            .unwrap();
        client.post(full_url)
    }
}
