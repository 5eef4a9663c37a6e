//! The catalog data model: products, their source files, version labels,
//! metadata, and collections.

pub mod collection;
pub mod file;
pub mod metadata;
pub mod product;
pub mod version;

pub use collection::{Collection, CollectionPolicy};
pub use file::{part_count, NewSource, SourceFile};
pub use metadata::Metadata;
pub use product::{Membership, Product, UploadState};
pub use version::{Revision, VersionLabel};
