use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Fallback for unknown routes. JSON clients get the same `{"msg": ...}`
/// shape the API uses for errors; everyone else gets plain text.
pub async fn not_found_handler(headers: HeaderMap) -> Response {
    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false);

    if wants_json {
        let msg = serde_json::json!({"msg": "not found"});
        (StatusCode::NOT_FOUND, Json(msg)).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain")],
            "not found",
        )
            .into_response()
    }
}
