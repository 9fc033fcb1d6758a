use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use shopfront_addresses::{Address, AddressText};
use shopfront_cart::{Cart, Quantity};
use shopfront_catalog::{NewProduct, Product, RecordId, StockLevels, Visibility};
use shopfront_core::{DomainError, ProductId, UserId};

use super::{AddressStore, CartStore, ProductStore, QuantityUpdate, StoreError, StoreResult};

#[derive(Debug, Default)]
struct ProductTable {
    next_record: i64,
    records: BTreeMap<RecordId, Product>,
    by_product_id: HashMap<ProductId, RecordId>,
}

impl ProductTable {
    fn push(&mut self, product_id: Option<ProductId>, new: NewProduct) -> Product {
        self.next_record += 1;
        let record_id = RecordId(self.next_record);
        if let Some(id) = &product_id {
            self.by_product_id.insert(id.clone(), record_id);
        }
        let product = Product::from_new(record_id, product_id, new);
        self.records.insert(record_id, product.clone());
        product
    }

    fn by_id_mut(&mut self, product_id: &ProductId) -> Option<&mut Product> {
        let record = self.by_product_id.get(product_id)?;
        self.records.get_mut(record)
    }
}

/// In-memory store for tests/dev.
///
/// Each operation runs inside one write-lock critical section, which gives the
/// same per-key atomicity the Postgres store gets from single statements.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    products: RwLock<ProductTable>,
    carts: RwLock<HashMap<UserId, Cart>>,
    addresses: RwLock<HashMap<UserId, Address>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn insert(&self, product_id: &ProductId, product: NewProduct) -> StoreResult<Product> {
        let mut table = write(&self.products)?;
        if table.by_product_id.contains_key(product_id) {
            return Err(StoreError::Conflict(format!("productId {product_id} already assigned")));
        }
        Ok(table.push(Some(product_id.clone()), product))
    }

    async fn insert_unassigned(&self, product: NewProduct) -> StoreResult<Product> {
        Ok(write(&self.products)?.push(None, product))
    }

    async fn get(&self, product_id: &ProductId) -> StoreResult<Option<Product>> {
        let table = read(&self.products)?;
        Ok(table
            .by_product_id
            .get(product_id)
            .and_then(|r| table.records.get(r))
            .cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        Ok(read(&self.products)?.records.values().cloned().collect())
    }

    async fn product_ids(&self) -> StoreResult<HashSet<ProductId>> {
        Ok(read(&self.products)?.by_product_id.keys().cloned().collect())
    }

    async fn list_unassigned(&self) -> StoreResult<Vec<Product>> {
        Ok(read(&self.products)?
            .records
            .values()
            .filter(|p| p.product_id.is_none())
            .cloned()
            .collect())
    }

    async fn assign_product_id(
        &self,
        record: RecordId,
        product_id: &ProductId,
    ) -> StoreResult<Option<Product>> {
        let mut table = write(&self.products)?;
        if table.by_product_id.contains_key(product_id) {
            return Err(StoreError::Conflict(format!("productId {product_id} already assigned")));
        }
        let Some(product) = table.records.get_mut(&record) else {
            return Ok(None);
        };
        if product.product_id.is_some() {
            return Ok(None);
        }
        product.product_id = Some(product_id.clone());
        let product = product.clone();
        table.by_product_id.insert(product_id.clone(), record);
        Ok(Some(product))
    }

    async fn set_visibility(
        &self,
        product_id: &ProductId,
        visibility: Visibility,
    ) -> StoreResult<Option<Product>> {
        let mut table = write(&self.products)?;
        Ok(table.by_id_mut(product_id).map(|p| {
            p.visibility = visibility;
            p.clone()
        }))
    }

    async fn update_stock(
        &self,
        product_id: &ProductId,
        stock: StockLevels,
    ) -> StoreResult<Option<Product>> {
        let mut table = write(&self.products)?;
        Ok(table.by_id_mut(product_id).map(|p| {
            p.in_stock_value = stock.in_stock_value;
            p.sold_stock_value = stock.sold_stock_value;
            p.clone()
        }))
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn add_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> StoreResult<Cart> {
        let mut carts = write(&self.carts)?;
        let cart = carts
            .entry(user_id.clone())
            .or_insert_with(|| Cart::new(user_id.clone()));
        let mut next = cart.clone();
        next.add(product_id.clone(), quantity)?;
        *cart = next.clone();
        Ok(next)
    }

    async fn get(&self, user_id: &UserId) -> StoreResult<Option<Cart>> {
        Ok(read(&self.carts)?.get(user_id).cloned())
    }

    async fn set_quantity(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> StoreResult<QuantityUpdate> {
        let mut carts = write(&self.carts)?;
        let Some(cart) = carts.get_mut(user_id) else {
            return Ok(QuantityUpdate::MissingCart);
        };
        match cart.set_quantity(product_id, quantity) {
            Ok(()) => Ok(QuantityUpdate::Updated(cart.clone())),
            Err(DomainError::NotFound(_)) => Ok(QuantityUpdate::MissingLine),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_item(&self, user_id: &UserId, product_id: &ProductId) -> StoreResult<Option<Cart>> {
        let mut carts = write(&self.carts)?;
        Ok(carts.get_mut(user_id).map(|cart| {
            cart.remove(product_id);
            cart.clone()
        }))
    }
}

#[async_trait]
impl AddressStore for InMemoryStore {
    async fn upsert(&self, user_id: &UserId, address: AddressText) -> StoreResult<Address> {
        let record = Address {
            user_id: user_id.clone(),
            address,
            updated_at: Utc::now(),
        };
        write(&self.addresses)?.insert(user_id.clone(), record.clone());
        Ok(record)
    }

    async fn get(&self, user_id: &UserId) -> StoreResult<Option<Address>> {
        Ok(read(&self.addresses)?.get(user_id).cloned())
    }
}
