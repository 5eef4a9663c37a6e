//! Signed object transfers.
//!
//! Both directions authenticate with the HMAC query signature minted by
//! the catalog, so a URL can be handed to curl or a browser as-is. The
//! gateway never consults the access control lists: possession of an
//! unexpired signed URL is the authorization.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;

use storage::{SignedQuery, StorageError};

use crate::ServiceState;

/// PUT /o/:bucket/*key
///
/// Stores one signed part (`part` + `upload` present) or a whole object.
pub async fn put_object(
    State(state): State<ServiceState>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<SignedQuery>,
    body: Bytes,
) -> Response {
    let catalog = state.catalog();
    if let Err(e) = catalog.signer().verify("PUT", &bucket, &key, &query) {
        return reject(e);
    }

    let stored = match (query.part, query.upload.as_deref()) {
        (Some(part), Some(upload_id)) => {
            catalog
                .storage()
                .put_part(&bucket, upload_id, part, body)
                .await
        }
        _ => catalog.storage().put(&bucket, &key, body).await,
    };
    match stored {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(e) => reject(e),
    }
}

/// GET /o/:bucket/*key
///
/// Streams the object out without buffering it whole.
pub async fn get_object(
    State(state): State<ServiceState>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<SignedQuery>,
) -> Response {
    let catalog = state.catalog();
    if let Err(e) = catalog.signer().verify("GET", &bucket, &key, &query) {
        return reject(e);
    }

    match catalog.storage().get_stream(&bucket, &key).await {
        Ok(stream) => {
            let mime = mime_guess::from_path(&key).first_or_octet_stream();
            match Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime.as_ref())
                .body(Body::from_stream(stream))
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("cannot build object response: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
        Err(e) => reject(e),
    }
}

fn reject(e: StorageError) -> Response {
    let status = match &e {
        StorageError::Signature(_) => StatusCode::FORBIDDEN,
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("gateway error: {}", e);
    }
    (status, Json(serde_json::json!({"msg": e.to_string()}))).into_response()
}
