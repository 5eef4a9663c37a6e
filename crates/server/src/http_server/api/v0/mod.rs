use axum::Router;

use crate::ServiceState;

pub mod collection;
pub mod error;
pub mod product;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/product", product::router(state.clone()))
        .nest("/collection", collection::router(state.clone()))
        .with_state(state)
}
