pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Cache, Collection, Health, Init, Product, Serve, Version};
