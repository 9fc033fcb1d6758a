//! Persistence abstractions for catalog, carts and addresses.
//!
//! Every mutating method is a single atomic operation against the backing
//! store (a conditional update or an upsert keyed by the record's natural
//! key). Callers never read a record, modify it and write it back.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use shopfront_addresses::{Address, AddressText};
use shopfront_cart::{Cart, Quantity};
use shopfront_catalog::{NewProduct, Product, RecordId, StockLevels, Visibility};
use shopfront_core::{DomainError, ProductId, UserId};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors, with the
/// exception of [`StoreError::Domain`], which carries domain rule violations
/// that only surface at write time (e.g. a merged quantity overflowing).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The backing store could not be reached or did not answer in time.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded into a domain value.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a product under `product_id`.
    ///
    /// Fails with [`StoreError::Conflict`] if the id is already assigned.
    async fn insert(&self, product_id: &ProductId, product: NewProduct) -> StoreResult<Product>;

    /// Insert a record without a product id (legacy import; input of backfill).
    async fn insert_unassigned(&self, product: NewProduct) -> StoreResult<Product>;

    async fn get(&self, product_id: &ProductId) -> StoreResult<Option<Product>>;

    async fn list(&self) -> StoreResult<Vec<Product>>;

    /// Every product id currently assigned.
    async fn product_ids(&self) -> StoreResult<HashSet<ProductId>>;

    /// Records still lacking a product id.
    async fn list_unassigned(&self) -> StoreResult<Vec<Product>>;

    /// Give `record` the id `product_id`, but only if it has none yet.
    ///
    /// `Ok(None)` when the record already has an id or no longer exists;
    /// [`StoreError::Conflict`] when `product_id` belongs to another record.
    async fn assign_product_id(
        &self,
        record: RecordId,
        product_id: &ProductId,
    ) -> StoreResult<Option<Product>>;

    /// `Ok(None)` when no product has this id.
    async fn set_visibility(
        &self,
        product_id: &ProductId,
        visibility: Visibility,
    ) -> StoreResult<Option<Product>>;

    /// Overwrite both stock counters. `Ok(None)` when no product has this id.
    async fn update_stock(
        &self,
        product_id: &ProductId,
        stock: StockLevels,
    ) -> StoreResult<Option<Product>>;
}

/// Outcome of a conditional quantity overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityUpdate {
    Updated(Cart),
    MissingCart,
    MissingLine,
}

#[async_trait]
pub trait CartStore: Send + Sync {
    /// Create the cart if needed and add `quantity` to the `(user, product)`
    /// line in one atomic step. Returns the cart after the write.
    async fn add_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> StoreResult<Cart>;

    async fn get(&self, user_id: &UserId) -> StoreResult<Option<Cart>>;

    async fn set_quantity(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> StoreResult<QuantityUpdate>;

    /// Remove the line if present. `Ok(None)` only when the cart does not exist.
    async fn remove_item(&self, user_id: &UserId, product_id: &ProductId) -> StoreResult<Option<Cart>>;
}

#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn upsert(&self, user_id: &UserId, address: AddressText) -> StoreResult<Address>;

    async fn get(&self, user_id: &UserId) -> StoreResult<Option<Address>>;
}
