use axum::routing::{get, post, put};
use axum::Router;

use crate::ServiceState;

pub mod complete;
pub mod confirm;
pub mod create;
pub mod delete;
pub mod delete_tree;
pub mod files;
pub mod get;
pub mod link;
pub mod search;
pub mod tree;
pub mod unlink;
pub mod update;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", put(create::handler))
        .route("/:id", get(get::handler).delete(delete::handler))
        .route("/:id/update", post(update::handler))
        .route("/:id/complete", post(complete::handler))
        .route("/:id/confirm", post(confirm::handler))
        .route("/:id/files", get(files::handler))
        .route("/:id/tree", get(tree::handler).delete(delete_tree::handler))
        .route("/:id/child/:child", put(link::handler).delete(unlink::handler))
        .route("/search/:text", get(search::handler))
        .with_state(state)
}
