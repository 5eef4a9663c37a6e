//! Shared error envelope for catalog API handlers.
//!
//! Every catalog failure maps through here, so the status taxonomy lives
//! in exactly one place and every error body is the same `{"msg": ...}`
//! JSON shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use common::prelude::CatalogError;

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(#[from] CatalogError);

/// Path ids arrive as raw strings: a malformed uuid is a validation
/// failure (422), not a missing route.
pub fn parse_id(raw: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw)
        .map_err(|_| Error(CatalogError::Invalid(format!("malformed id: {}", raw))))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CatalogError::DuplicateName(_)
            | CatalogError::Conflict(_)
            | CatalogError::CollectionNotEmpty(_) => StatusCode::CONFLICT,
            CatalogError::SourcesNotReady(_) => StatusCode::FAILED_DEPENDENCY,
            CatalogError::Forbidden(_) => StatusCode::FORBIDDEN,
            CatalogError::UnknownOwner(_) => StatusCode::NOT_ACCEPTABLE,
            CatalogError::Inconsistent(_) | CatalogError::Store(_) | CatalogError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!("catalog API error: {}", self.0);
        }
        let msg = serde_json::json!({"msg": self.0.to_string()});
        (status, Json(msg)).into_response()
    }
}
