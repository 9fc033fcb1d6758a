//! Shopping carts.
//!
//! Product ids in a cart are not checked against the catalog; pricing skips
//! lines whose product has disappeared or been hidden.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use shopfront_cart::{Cart, CartSummary, Quantity, price_cart};
use shopfront_core::{ProductId, UserId};

use super::{ServiceError, ServiceResult, ServiceSettings, timed};
use crate::store::{CartStore, ProductStore, QuantityUpdate};

#[derive(Clone)]
pub struct ShoppingCarts {
    carts: Arc<dyn CartStore>,
    products: Arc<dyn ProductStore>,
    op_timeout: Duration,
}

impl std::fmt::Debug for ShoppingCarts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShoppingCarts")
            .field("op_timeout", &self.op_timeout)
            .finish_non_exhaustive()
    }
}

impl ShoppingCarts {
    pub fn new(
        carts: Arc<dyn CartStore>,
        products: Arc<dyn ProductStore>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            carts,
            products,
            op_timeout: settings.op_timeout,
        }
    }

    /// Add `quantity` units, creating the cart and line as needed.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id), err)]
    pub async fn add_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> ServiceResult<Cart> {
        let quantity = Quantity::new(quantity)?;
        let cart = timed(self.op_timeout, self.carts.add_item(user_id, product_id, quantity)).await?;
        info!(lines = cart.lines().len(), "item added to cart");
        Ok(cart)
    }

    pub async fn get_cart(&self, user_id: &UserId) -> ServiceResult<Cart> {
        timed(self.op_timeout, self.carts.get(user_id))
            .await?
            .ok_or_else(|| ServiceError::not_found("cart"))
    }

    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id), err)]
    pub async fn update_quantity(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> ServiceResult<Cart> {
        let quantity = Quantity::new(quantity)?;
        match timed(self.op_timeout, self.carts.set_quantity(user_id, product_id, quantity)).await? {
            QuantityUpdate::Updated(cart) => Ok(cart),
            QuantityUpdate::MissingCart => Err(ServiceError::not_found("cart")),
            QuantityUpdate::MissingLine => Err(ServiceError::not_found("cart line item")),
        }
    }

    /// Removing a product that is not in the cart succeeds and changes nothing.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id), err)]
    pub async fn remove_item(&self, user_id: &UserId, product_id: &ProductId) -> ServiceResult<Cart> {
        timed(self.op_timeout, self.carts.remove_item(user_id, product_id))
            .await?
            .ok_or_else(|| ServiceError::not_found("cart"))
    }

    /// Price the cart against the current catalog.
    pub async fn summary(&self, user_id: &UserId) -> ServiceResult<CartSummary> {
        let cart = self.get_cart(user_id).await?;

        let mut catalog = HashMap::with_capacity(cart.lines().len());
        for line in cart.lines() {
            if let Some(product) = timed(self.op_timeout, self.products.get(&line.product_id)).await? {
                catalog.insert(line.product_id.clone(), product);
            }
        }

        Ok(price_cart(cart.lines(), |id| catalog.get(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ErrorKind;
    use crate::store::InMemoryStore;
    use rust_decimal::Decimal;
    use shopfront_catalog::{NewProduct, ProductDraft, Visibility};
    use shopfront_core::DomainError;

    fn carts() -> (ShoppingCarts, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let carts = ShoppingCarts::new(store.clone(), store.clone(), ServiceSettings::default());
        (carts, store)
    }

    fn user(id: &str) -> UserId {
        UserId::parse(id).unwrap()
    }

    fn product(id: &str) -> ProductId {
        ProductId::parse(id).unwrap()
    }

    fn qty_of(cart: &Cart, id: &str) -> Option<u32> {
        cart.line(&product(id)).map(|l| l.quantity.get())
    }

    #[tokio::test]
    async fn adding_twice_merges_into_one_line() {
        let (carts, _) = carts();
        carts.add_item(&user("u1"), &product("p1"), 1).await.unwrap();
        carts.add_item(&user("u1"), &product("p1"), 1).await.unwrap();

        let cart = carts.get_cart(&user("u1")).await.unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(qty_of(&cart, "p1"), Some(2));
    }

    #[tokio::test]
    async fn merged_quantities_add_up() {
        let (carts, _) = carts();
        carts.add_item(&user("u"), &product("p"), 2).await.unwrap();
        let cart = carts.add_item(&user("u"), &product("p"), 3).await.unwrap();
        assert_eq!(qty_of(&cart, "p"), Some(5));
    }

    #[tokio::test]
    async fn non_positive_quantities_are_rejected() {
        let (carts, _) = carts();
        for bad in [0, -1] {
            let err = carts.add_item(&user("u"), &product("p"), bad).await.unwrap_err();
            assert!(matches!(err, ServiceError::Domain(DomainError::InvalidQuantity(_))));
        }
        assert_eq!(carts.get_cart(&user("u")).await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn concurrent_adds_sum_every_quantity() {
        let (carts, _) = carts();

        let handles = (1..=20)
            .map(|n| {
                let carts = carts.clone();
                tokio::spawn(async move { carts.add_item(&user("u"), &product("p"), n).await.unwrap() })
            })
            .collect::<Vec<_>>();
        for h in handles {
            h.await.unwrap();
        }

        let cart = carts.get_cart(&user("u")).await.unwrap();
        assert_eq!(qty_of(&cart, "p"), Some((1..=20).sum()));
    }

    #[tokio::test]
    async fn cart_that_was_never_created_is_not_found() {
        let (carts, _) = carts();
        assert_eq!(carts.get_cart(&user("nobody")).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            carts.remove_item(&user("nobody"), &product("p")).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn update_quantity_requires_cart_and_line() {
        let (carts, _) = carts();
        let err = carts.update_quantity(&user("u"), &product("p"), 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        carts.add_item(&user("u"), &product("p"), 1).await.unwrap();
        let err = carts.update_quantity(&user("u"), &product("q"), 2).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound("cart line item"))));

        let cart = carts.update_quantity(&user("u"), &product("p"), 7).await.unwrap();
        assert_eq!(qty_of(&cart, "p"), Some(7));
    }

    #[tokio::test]
    async fn zero_quantity_update_leaves_stored_quantity() {
        let (carts, _) = carts();
        carts.add_item(&user("u"), &product("p"), 3).await.unwrap();

        let err = carts.update_quantity(&user("u"), &product("p"), 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidQuantity(0))));

        let cart = carts.get_cart(&user("u")).await.unwrap();
        assert_eq!(qty_of(&cart, "p"), Some(3));
    }

    #[tokio::test]
    async fn removing_an_absent_line_is_a_no_op() {
        let (carts, _) = carts();
        let before = carts.add_item(&user("u"), &product("p"), 2).await.unwrap();
        let after = carts.remove_item(&user("u"), &product("zzz")).await.unwrap();
        assert_eq!(before, after);

        let emptied = carts.remove_item(&user("u"), &product("p")).await.unwrap();
        assert!(emptied.is_empty());
        assert!(carts.get_cart(&user("u")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn summary_prices_visible_products_only() {
        let (carts, store) = carts();
        let mut ids = Vec::new();
        for (name, price) in [("Kurta", 500), ("Saree", 1200)] {
            let new = NewProduct::validate(ProductDraft {
                name: name.to_string(),
                price: Decimal::new(price, 0),
                category: "Sarees".to_string(),
                ..ProductDraft::default()
            })
            .unwrap();
            let id = product(&format!("{}", 100_000 + price));
            store.insert(&id, new).await.unwrap();
            ids.push(id);
        }
        store.set_visibility(&ids[1], Visibility::Off).await.unwrap();

        carts.add_item(&user("u"), &ids[0], 2).await.unwrap();
        carts.add_item(&user("u"), &ids[1], 1).await.unwrap();
        carts.add_item(&user("u"), &product("gone"), 4).await.unwrap();

        let summary = carts.summary(&user("u")).await.unwrap();
        assert_eq!(summary.subtotal, Decimal::new(1000, 0));
        assert_eq!(summary.total, summary.subtotal);
        assert_eq!(summary.skipped, vec![ids[1].clone(), product("gone")]);
    }
}
