//! Object storage for the granary catalog.
//!
//! This crate owns everything byte-shaped: the pluggable object-store
//! backend (in-memory, local directory, or S3-compatible), staged
//! multipart transfers, streaming verification of stored objects, and the
//! HMAC-signed URLs the transfer gateway hands to clients.

mod config;
mod error;
mod signer;
mod store;

pub use config::StorageConfig;
pub use error::StorageError;
pub use signer::{SignedQuery, UrlSigner};
pub use store::{ObjectStat, Storage};
