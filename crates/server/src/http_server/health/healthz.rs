use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::time::timeout;

use crate::ServiceState;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Readiness probe: healthy when the catalog store answers.
pub async fn handler(State(state): State<ServiceState>) -> Response {
    match timeout(HEALTH_CHECK_TIMEOUT, state.is_ready()).await {
        Ok(true) => {
            let msg = serde_json::json!({"status": "ok"});
            (StatusCode::OK, Json(msg)).into_response()
        }
        Ok(false) => {
            let msg = serde_json::json!({
                "status": "failure",
                "message": "catalog store isn't available"
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response()
        }
        Err(_) => {
            let msg = serde_json::json!({
                "status": "failure",
                "message": "health check timed out"
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ServiceConfig;

    #[tokio::test]
    async fn test_handler_direct() {
        let state = ServiceState::from_config(&ServiceConfig::default())
            .await
            .unwrap();
        let response = handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
