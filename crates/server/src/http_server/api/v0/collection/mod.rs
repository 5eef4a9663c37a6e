use axum::routing::{get, post, put};
use axum::Router;

use crate::ServiceState;

pub mod add;
pub mod create;
pub mod delete;
pub mod get;
pub mod link;
pub mod remove;
pub mod search;
pub mod unlink;
pub mod update;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", put(create::handler))
        .route("/:id", get(get::handler).delete(delete::handler))
        .route("/:id/update", post(update::handler))
        .route(
            "/:id/product/:product_id",
            put(add::handler).delete(remove::handler),
        )
        .route("/:id/child/:child", put(link::handler).delete(unlink::handler))
        .route("/search/:text", get(search::handler))
        .with_state(state)
}
