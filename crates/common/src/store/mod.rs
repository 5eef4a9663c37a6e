//! Catalog persistence: the store trait and the in-memory implementation.
//! The SQLite-backed implementation lives in the server crate.

mod memory;
mod provider;

pub use memory::MemoryCatalogStore;
pub use provider::{CatalogStore, StoreError};
