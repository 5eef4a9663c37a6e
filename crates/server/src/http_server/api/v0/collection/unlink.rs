use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http_server::api::auth::Auth;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::error::{parse_id, Error};
use crate::ServiceState;

use super::link::LinkResponse;

/// `DELETE /api/v0/collection/:id/child/:child`: undo a nesting edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlinkRequest {
    pub parent: Uuid,
    pub child: Uuid,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Auth(who): Auth,
    Path((parent, child)): Path<(String, String)>,
) -> Result<impl IntoResponse, Error> {
    let parent = parse_id(&parent)?;
    let child = parse_id(&child)?;
    state
        .catalog()
        .remove_child_collection(&who, parent, child)
        .await?;
    Ok((http::StatusCode::OK, Json(LinkResponse { parent, child })).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for UnlinkRequest {
    type Response = LinkResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!(
                "/api/v0/collection/{}/child/{}",
                self.parent, self.child
            ))
            .unwrap();
        client.delete(full_url)
    }
}
