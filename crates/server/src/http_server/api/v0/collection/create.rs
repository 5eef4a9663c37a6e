use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::Collection;
use common::service::NewCollection;

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::Error;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct CreateRequest {
    /// Name of the collection, unique across the catalog
    #[arg(long)]
    pub name: String,
    /// Free-form description
    #[arg(long, default_value = "")]
    #[serde(default)]
    pub description: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Json(req): Json<CreateRequest>,
) -> Result<impl IntoResponse, Error> {
    let collection = state
        .catalog()
        .create_collection(
            &who,
            NewCollection {
                name: req.name,
                description: req.description,
            },
        )
        .await?;
    Ok((http::StatusCode::CREATED, Json(collection)).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for CreateRequest {
    type Response = Collection;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/collection").unwrap();
        client.put(full_url).json(&self)
    }
}
