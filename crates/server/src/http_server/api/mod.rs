use axum::Router;

use crate::ServiceState;

pub mod auth;
pub mod client;
pub mod v0;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new().nest("/v0", v0::router(state))
}
