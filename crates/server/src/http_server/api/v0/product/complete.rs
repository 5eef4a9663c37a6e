use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::prelude::Product;
use common::service::CompleteUpload;

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::{parse_id, Error};
use crate::ServiceState;

/// `POST /api/v0/product/:id/complete`: the client reports its transfer
/// receipts; the service checks them against the declarations and moves
/// the node to `Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteRequest {
    pub id: Uuid,
    pub upload: CompleteUpload,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Path(id): Path<String>,
    Json(upload): Json<CompleteUpload>,
) -> Result<impl IntoResponse, Error> {
    let id = parse_id(&id)?;
    let product = state.catalog().complete_product(&who, id, upload).await?;
    Ok((http::StatusCode::OK, Json(product)).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for CompleteRequest {
    type Response = Product;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!("/api/v0/product/{}/complete", self.id))
            .unwrap();
        client.post(full_url).json(&self.upload)
    }
}
