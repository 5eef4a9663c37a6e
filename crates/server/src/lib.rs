//! Catalog server plumbing plus the client-side state the `granary`
//! binary leans on: HTTP surfaces, the sqlite store, process lifecycle,
//! and the on-disk config that points a CLI at a remote.

pub(crate) mod database;
pub mod http_server;
pub mod process;
pub mod service_config;
pub mod service_state;
pub mod state;
pub mod version;

pub use process::{spawn_service, start_service, ShutdownHandle};
pub use service_config::Config as ServiceConfig;
pub use service_state::State as ServiceState;
pub use state::{AppConfig, AppState, CacheTierConfig, StateError};
