use axum::Json;

use crate::version::{build_info, BuildInfo};

/// Build identification for deploy verification.
pub async fn handler() -> Json<BuildInfo> {
    Json(build_info())
}
