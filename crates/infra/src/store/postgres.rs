//! Postgres-backed store.
//!
//! Every mutation is one statement keyed by the record's natural key, so
//! concurrent requests are serialized by row locks and unique indexes rather
//! than by application-level read-modify-write.
//!
//! ## Error Mapping
//!
//! | SQLx error | SQLSTATE | StoreError |
//! |---|---|---|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (numeric out of range) | `22003` | `Domain(Validation)` |
//! | Database (check violation) | `23514` | `Domain(Validation)` |
//! | Database (other) | any other | `Unavailable` |
//! | Column decode / type mismatch | N/A | `Corrupt` |
//! | Pool timeout / closed, IO, TLS | N/A | `Unavailable` |

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use shopfront_addresses::{Address, AddressText};
use shopfront_cart::{Cart, LineItem, Quantity};
use shopfront_catalog::{Category, NewProduct, Product, RecordId, StockLevels, Visibility};
use shopfront_core::{DomainError, ProductId, UserId};

use super::{AddressStore, CartStore, ProductStore, QuantityUpdate, StoreError, StoreResult};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// Postgres-backed store for products, carts and addresses.
///
/// Uses a SQLx connection pool, which is thread-safe (Arc + Send + Sync).
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool. `acquire_timeout` bounds how long a request waits for a connection.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn load_cart(&self, user_id: &UserId) -> StoreResult<Option<Cart>> {
        let rows = sqlx::query(
            r#"
            SELECT c.user_id, i.product_id, i.quantity
            FROM carts c
            LEFT JOIN cart_items i ON i.user_id = c.user_id
            WHERE c.user_id = $1
            ORDER BY i.added_at, i.product_id
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_cart", e))?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut lines = Vec::with_capacity(rows.len());
        for row in &rows {
            let product_id: Option<String> = row.try_get("product_id").map_err(corrupt)?;
            let quantity: Option<i32> = row.try_get("quantity").map_err(corrupt)?;
            if let (Some(product_id), Some(quantity)) = (product_id, quantity) {
                lines.push(LineItem {
                    product_id: ProductId::parse(product_id).map_err(corrupt_domain)?,
                    quantity: Quantity::new(i64::from(quantity)).map_err(corrupt_domain)?,
                });
            }
        }

        Cart::from_lines(user_id.clone(), lines)
            .map(Some)
            .map_err(corrupt_domain)
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    #[instrument(skip(self, product), fields(product_id = %product_id), err)]
    async fn insert(&self, product_id: &ProductId, product: NewProduct) -> StoreResult<Product> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (
                product_id, name, price, category, rating, img,
                in_stock_value, sold_stock_value, visibility
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, product_id, name, price, category, rating, img,
                      in_stock_value, sold_stock_value, visibility
            "#,
        )
        .bind(product_id.as_str())
        .bind(&product.name)
        .bind(product.price)
        .bind(product.category.as_str())
        .bind(product.rating)
        .bind(product.img.as_deref())
        .bind(to_i32("inStockValue", product.stock.in_stock_value)?)
        .bind(to_i32("soldStockValue", product.stock.sold_stock_value)?)
        .bind(product.visibility.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        product_from_row(&row)
    }

    #[instrument(skip(self, product), err)]
    async fn insert_unassigned(&self, product: NewProduct) -> StoreResult<Product> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (
                name, price, category, rating, img,
                in_stock_value, sold_stock_value, visibility
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, product_id, name, price, category, rating, img,
                      in_stock_value, sold_stock_value, visibility
            "#,
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(product.category.as_str())
        .bind(product.rating)
        .bind(product.img.as_deref())
        .bind(to_i32("inStockValue", product.stock.in_stock_value)?)
        .bind(to_i32("soldStockValue", product.stock.sold_stock_value)?)
        .bind(product.visibility.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_unassigned_product", e))?;

        product_from_row(&row)
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn get(&self, product_id: &ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, product_id, name, price, category, rating, img,
                   in_stock_value, sold_stock_value, visibility
            FROM products
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, name, price, category, rating, img,
                   in_stock_value, sold_stock_value, visibility
            FROM products
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn product_ids(&self) -> StoreResult<HashSet<ProductId>> {
        let rows = sqlx::query("SELECT product_id FROM products WHERE product_id IS NOT NULL")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product_ids", e))?;

        rows.iter()
            .map(|row| {
                let raw: String = row.try_get("product_id").map_err(corrupt)?;
                ProductId::parse(raw).map_err(corrupt_domain)
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn list_unassigned(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, name, price, category, rating, img,
                   in_stock_value, sold_stock_value, visibility
            FROM products
            WHERE product_id IS NULL
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_unassigned", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), fields(record = %record, product_id = %product_id), err)]
    async fn assign_product_id(
        &self,
        record: RecordId,
        product_id: &ProductId,
    ) -> StoreResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET product_id = $2
            WHERE id = $1 AND product_id IS NULL
            RETURNING id, product_id, name, price, category, rating, img,
                      in_stock_value, sold_stock_value, visibility
            "#,
        )
        .bind(record.0)
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("assign_product_id", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn set_visibility(
        &self,
        product_id: &ProductId,
        visibility: Visibility,
    ) -> StoreResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET visibility = $2
            WHERE product_id = $1
            RETURNING id, product_id, name, price, category, rating, img,
                      in_stock_value, sold_stock_value, visibility
            "#,
        )
        .bind(product_id.as_str())
        .bind(visibility.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_visibility", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn update_stock(
        &self,
        product_id: &ProductId,
        stock: StockLevels,
    ) -> StoreResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET in_stock_value = $2, sold_stock_value = $3
            WHERE product_id = $1
            RETURNING id, product_id, name, price, category, rating, img,
                      in_stock_value, sold_stock_value, visibility
            "#,
        )
        .bind(product_id.as_str())
        .bind(to_i32("inStockValue", stock.in_stock_value)?)
        .bind(to_i32("soldStockValue", stock.sold_stock_value)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_stock", e))?;

        row.as_ref().map(product_from_row).transpose()
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id, quantity = %quantity), err)]
    async fn add_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> StoreResult<Cart> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("add_item_begin", e))?;

        sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("add_item_cart", e))?;

        let line = sqlx::query(
            r#"
            INSERT INTO cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            WHERE cart_items.quantity <= 2147483647 - EXCLUDED.quantity
            "#,
        )
        .bind(user_id.as_str())
        .bind(product_id.as_str())
        .bind(to_i32("quantity", quantity.get())?)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("add_item_line", e))?;

        // Zero rows means the existing line refused the merge; the transaction
        // is rolled back on drop.
        if line.rows_affected() == 0 {
            let existing: i32 = sqlx::query_scalar(
                "SELECT quantity FROM cart_items WHERE user_id = $1 AND product_id = $2",
            )
            .bind(user_id.as_str())
            .bind(product_id.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("add_item_existing", e))?;
            let existing = Quantity::new(i64::from(existing)).map_err(corrupt_domain)?;
            return Err(match existing.merge(quantity) {
                Err(e) => e.into(),
                Ok(merged) => StoreError::Corrupt(format!(
                    "line {product_id} refused a merge to {merged}"
                )),
            });
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("add_item_commit", e))?;

        self.load_cart(user_id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("cart for {user_id} vanished after add")))
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn get(&self, user_id: &UserId) -> StoreResult<Option<Cart>> {
        self.load_cart(user_id).await
    }

    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id, quantity = %quantity), err)]
    async fn set_quantity(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> StoreResult<QuantityUpdate> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3 WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id.as_str())
        .bind(product_id.as_str())
        .bind(to_i32("quantity", quantity.get())?)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_quantity", e))?;

        let cart = self.load_cart(user_id).await?;
        Ok(match (result.rows_affected(), cart) {
            (_, None) => QuantityUpdate::MissingCart,
            (0, Some(_)) => QuantityUpdate::MissingLine,
            (_, Some(cart)) => QuantityUpdate::Updated(cart),
        })
    }

    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id), err)]
    async fn remove_item(&self, user_id: &UserId, product_id: &ProductId) -> StoreResult<Option<Cart>> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id.as_str())
            .bind(product_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_item", e))?;

        self.load_cart(user_id).await
    }
}

#[async_trait]
impl AddressStore for PostgresStore {
    #[instrument(skip(self, address), fields(user_id = %user_id), err)]
    async fn upsert(&self, user_id: &UserId, address: AddressText) -> StoreResult<Address> {
        let row = sqlx::query(
            r#"
            INSERT INTO addresses (user_id, address, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET address = EXCLUDED.address, updated_at = NOW()
            RETURNING user_id, address, updated_at
            "#,
        )
        .bind(user_id.as_str())
        .bind(address.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_address", e))?;

        address_from_row(&row)
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn get(&self, user_id: &UserId) -> StoreResult<Option<Address>> {
        let row = sqlx::query("SELECT user_id, address, updated_at FROM addresses WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_address", e))?;

        row.as_ref().map(address_from_row).transpose()
    }
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    let product_id: Option<String> = row.try_get("product_id").map_err(corrupt)?;
    let category: String = row.try_get("category").map_err(corrupt)?;
    let visibility: String = row.try_get("visibility").map_err(corrupt)?;
    let price: Decimal = row.try_get("price").map_err(corrupt)?;
    let in_stock: i32 = row.try_get("in_stock_value").map_err(corrupt)?;
    let sold: i32 = row.try_get("sold_stock_value").map_err(corrupt)?;

    Ok(Product {
        record_id: RecordId(row.try_get("id").map_err(corrupt)?),
        product_id: product_id
            .map(ProductId::parse)
            .transpose()
            .map_err(corrupt_domain)?,
        name: row.try_get("name").map_err(corrupt)?,
        price,
        category: Category::parse(&category).map_err(corrupt_domain)?,
        rating: row.try_get("rating").map_err(corrupt)?,
        img: row.try_get("img").map_err(corrupt)?,
        in_stock_value: u32::try_from(in_stock).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        sold_stock_value: u32::try_from(sold).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        visibility: Visibility::parse(&visibility).map_err(corrupt_domain)?,
    })
}

fn address_from_row(row: &PgRow) -> StoreResult<Address> {
    let user_id: String = row.try_get("user_id").map_err(corrupt)?;
    let address: String = row.try_get("address").map_err(corrupt)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(corrupt)?;
    Ok(Address {
        user_id: UserId::parse(user_id).map_err(corrupt_domain)?,
        address: AddressText::new(address).map_err(corrupt_domain)?,
        updated_at,
    })
}

fn to_i32(field: &str, value: u32) -> StoreResult<i32> {
    i32::try_from(value)
        .map_err(|_| StoreError::Domain(DomainError::validation(format!("{field} is too large: {value}"))))
}

fn corrupt(err: sqlx::Error) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

fn corrupt_domain(err: DomainError) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("22003") | Some("23514") => StoreError::Domain(DomainError::validation(msg)),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Corrupt(format!("decode error in {}: {}", operation, err))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("timed out waiting for a connection in {}", operation))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}
