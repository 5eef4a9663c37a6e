pub mod cache;
pub mod collection;
pub mod health;
pub mod init;
pub mod product;
pub mod serve;
pub mod version;

pub use cache::Cache;
pub use collection::Collection;
pub use health::Health;
pub use init::Init;
pub use product::Product;
pub use serve::Serve;
pub use version::Version;
