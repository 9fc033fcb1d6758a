//! Catalog domain module.
//!
//! This crate contains business rules for products, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). The only source of
//! non-determinism is the random id source in [`identity`], which is injectable.

pub mod identity;
pub mod product;

pub use identity::{IdSource, IdentityGenerator, RandomIdSource};
pub use product::{
    Category, ListingScope, NewProduct, Product, ProductDraft, RecordId, StockLevels, Visibility,
};
