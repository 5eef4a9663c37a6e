use axum::routing::get;
use axum::Router;

use crate::ServiceState;

mod healthz;
mod version;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/healthz", get(healthz::handler))
        .route("/version", get(version::handler))
        .with_state(state)
}
