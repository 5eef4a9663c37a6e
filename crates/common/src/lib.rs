/**
 * Privilege grants, per-document ACLs, and the read policy switch.
 */
pub mod access;
/**
 * Client-side tiered cache for downloaded sources.
 */
pub mod cache;
/**
 * The catalog data model: products, sources, versions,
 *  collections, metadata.
 */
pub mod catalog;
/**
 * Typed checksums, sha256 only for now.
 */
pub mod checksum;
/**
 * The catalog services: create/complete/confirm, version
 *  walks, collections, deletes, search. Everything the API
 *  exposes goes through here.
 */
pub mod service;
/**
 * Persistence seam and the in-memory reference store.
 */
pub mod store;

pub mod prelude {
    pub use crate::access::{Grants, Principal, Privilege, ReadPolicy};
    pub use crate::catalog::{
        Collection, CollectionPolicy, Metadata, Product, SourceFile, UploadState, VersionLabel,
    };
    pub use crate::checksum::Checksum;
    pub use crate::service::{Catalog, CatalogError};
    pub use crate::store::{CatalogStore, MemoryCatalogStore};
}
