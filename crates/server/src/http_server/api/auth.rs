//! Bearer token authentication for catalog API requests.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use common::prelude::Principal;

use crate::ServiceState;

/// The authenticated caller, resolved from the `Authorization` header.
///
/// Requests without the header act as the configured anonymous principal;
/// when none is configured, or the token is unknown, the request is
/// rejected before any handler runs.
pub struct Auth(pub Principal);

#[axum::async_trait]
impl FromRequestParts<ServiceState> for Auth {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        match header {
            Some(value) => {
                let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
                match state.auth().resolve(token) {
                    Some(principal) => Ok(Auth(principal)),
                    None => Err(unauthorized("unknown token")),
                }
            }
            None => match state.auth().anonymous() {
                Some(principal) => Ok(Auth(principal)),
                None => Err(unauthorized("missing bearer token")),
            },
        }
    }
}

fn unauthorized(reason: &str) -> Response {
    let msg = serde_json::json!({"msg": reason});
    (StatusCode::UNAUTHORIZED, Json(msg)).into_response()
}
